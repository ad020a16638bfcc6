//! Heuristics over the raw shell byte stream.
//!
//! The shell exposes no framed protocol, so command completion and
//! credential prompts are inferred from text patterns. The prompt rule is
//! deliberately the simple one the engine has always used: a line whose
//! trimmed text ends in `$`. It misfires on root prompts (`#`), customized
//! prompt strings, and output that itself ends in `$`. That fragility is a
//! documented limitation of the design, not something to paper over with
//! extra heuristics.

/// Whether a line looks like the shell awaiting input.
#[must_use]
pub fn is_prompt_line(line: &str) -> bool {
    line.trim().ends_with('$')
}

/// Whether `text` contains a credential/elevation prompt marker.
///
/// Case-insensitive substring match covering `[sudo]`, `password` and
/// `Password:` style prompts.
#[must_use]
pub fn contains_credential_prompt(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("[sudo]") || lower.contains("password")
}

/// The trailing (possibly still incomplete) line of the buffer.
#[must_use]
pub fn last_line(buffer: &str) -> &str {
    buffer.rsplit('\n').next().unwrap_or(buffer)
}

/// Clean a captured buffer into command output.
///
/// Drops the echoed command (first line only), prompt lines, and
/// credential-prompt lines, then joins the rest and trims the edges.
#[must_use]
pub fn sanitize_output(raw: &str, command: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for (index, line) in raw.split('\n').enumerate() {
        if index == 0 && line.trim() == command {
            continue;
        }
        if is_prompt_line(line) {
            continue;
        }
        if contains_credential_prompt(line) {
            continue;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}

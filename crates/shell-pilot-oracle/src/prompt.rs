//! System prompt template handling.

use std::io;
use std::path::Path;

/// Placeholder replaced with the bounded history text on every request.
pub const HISTORY_PLACEHOLDER: &str = "{history}";

/// Read the system prompt template from disk. Loaded once at startup.
///
/// # Errors
/// Returns the underlying I/O error if the file cannot be read.
pub fn load_template(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Substitute the bounded history into the template.
#[must_use]
pub fn render_system_prompt(template: &str, history: &str) -> String {
    template.replace(HISTORY_PLACEHOLDER, history)
}

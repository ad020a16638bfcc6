//! End-of-run artifacts: event history and summary files.

use std::io;
use std::path::Path;

use chrono::Utc;
use shell_pilot_core::{StepEvent, history::render_events};

/// Write the full history, one JSON object per line, chronological.
///
/// # Errors
/// Returns the underlying I/O error if the directory or file cannot be
/// written.
pub async fn write_history(path: &Path, events: &[StepEvent]) -> io::Result<()> {
    ensure_parent(path).await?;
    let mut text = render_events(events);
    if !text.is_empty() {
        text.push('\n');
    }
    tokio::fs::write(path, text).await
}

/// Write the summary, prefixed with a generation timestamp line.
///
/// # Errors
/// Returns the underlying I/O error if the directory or file cannot be
/// written.
pub async fn write_summary(path: &Path, summary: &str) -> io::Result<()> {
    ensure_parent(path).await?;
    let stamped = format!("Generated at {}\n\n{summary}\n", Utc::now().to_rfc3339());
    tokio::fs::write(path, stamped).await
}

/// Minimal report written when summarization fails, so the run is never
/// lost entirely.
#[must_use]
pub fn fallback_report(event_count: usize, failure: &str) -> String {
    format!("Session recorded {event_count} events. Summarization failed: {failure}")
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

//! Append-only event history with bounding and windowing.
//!
//! Two size controls keep long sessions tractable for the oracle:
//! - Per-event: command output over [`OUTPUT_HEAD_CHARS`] characters is
//!   truncated to its head plus its tail, preserving what the command did
//!   and the final state it left behind.
//! - Whole-log: serialization keeps the last [`RECENT_WINDOW`] events
//!   verbatim and reduces everything older to a free-text summary.

use serde::Serialize;

use crate::event::StepEvent;

/// Number of most-recent events serialized verbatim for the oracle.
pub const RECENT_WINDOW: usize = 10;

/// Outputs longer than this many characters are truncated.
pub const OUTPUT_HEAD_CHARS: usize = 1000;

/// Characters kept from the end of a truncated output.
pub const OUTPUT_TAIL_CHARS: usize = 300;

/// Marker inserted between the head and tail of a truncated output.
pub const OUTPUT_ELLIPSIS: &str = "...";

/// Append-only chronological record of step outcomes.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<StepEvent>,
}

/// How the log splits for serialization to the oracle.
#[derive(Debug)]
pub enum HistoryWindow<'a> {
    /// The whole record fits; serialize it verbatim.
    Verbatim(&'a [StepEvent]),
    /// `older` must be summarized; `recent` is serialized verbatim.
    Split {
        older: &'a [StepEvent],
        recent: &'a [StepEvent],
    },
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event, bounding its output in place.
    pub fn push(&mut self, mut event: StepEvent) {
        if let Some(output) = &event.output {
            if let Some(bounded) = bound_output(output) {
                event.output = Some(bounded);
            }
        }
        self.events.push(event);
    }

    /// All events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Split the log into the segment to summarize and the verbatim window.
    #[must_use]
    pub fn window(&self) -> HistoryWindow<'_> {
        if self.events.len() <= RECENT_WINDOW {
            HistoryWindow::Verbatim(&self.events)
        } else {
            let split = self.events.len() - RECENT_WINDOW;
            let (older, recent) = self.events.split_at(split);
            HistoryWindow::Split { older, recent }
        }
    }
}

/// Bound one output string, or `None` if it is already within the limit.
fn bound_output(output: &str) -> Option<String> {
    let total = output.chars().count();
    if total <= OUTPUT_HEAD_CHARS {
        return None;
    }
    let head: String = output.chars().take(OUTPUT_HEAD_CHARS).collect();
    let tail: String = output.chars().skip(total - OUTPUT_TAIL_CHARS).collect();
    Some(format!("{head}{OUTPUT_ELLIPSIS}{tail}"))
}

/// Serialize events verbatim, one JSON object per line, oldest first.
///
/// This is both the oracle-facing format and the on-disk history format.
#[must_use]
pub fn render_events(events: &[StepEvent]) -> String {
    events.iter().filter_map(to_json_line).collect::<Vec<_>>().join("\n")
}

/// Concatenate an older-history summary with the verbatim recent window.
#[must_use]
pub fn render_bounded(summary: &str, recent: &[StepEvent]) -> String {
    format!(
        "=== Earlier events (summarized) ===\n{summary}\n\n=== Recent {} events (verbatim) ===\n{}",
        recent.len(),
        render_events(recent),
    )
}

fn to_json_line<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(err) => {
            tracing::error!("failed to serialize event: {err}");
            None
        }
    }
}

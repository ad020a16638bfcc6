//! Step events: the immutable record of one attempted action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of action a session step performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Authenticate the transport and open the shell.
    Connect,
    /// Close the shell (if open) and the transport.
    Disconnect,
    /// Disconnect followed by a fresh connect.
    Reconnect,
    /// Open the interactive shell channel.
    ShellCreate,
    /// Close the interactive shell channel.
    ShellClose,
    /// Run a command on the shell and capture its output.
    ShellCommand,
    /// Send an interrupt (Ctrl+C) to the shell.
    Interrupt,
    /// Interrupt issued because a command exceeded its time budget.
    TimeoutInterrupt,
}

impl EventKind {
    /// Whether events of this kind carry `command` and `output`.
    #[must_use]
    pub const fn carries_command(self) -> bool {
        matches!(self, Self::ShellCommand | Self::TimeoutInterrupt)
    }
}

/// The subset of [`EventKind`] that carries a command and its output.
///
/// Used as a constructor argument so command-bearing events cannot be
/// built with a non-command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A command that ran to a detected completion (or failed outright).
    ShellCommand,
    /// A command cut short by a timeout-triggered interrupt.
    TimeoutInterrupt,
}

impl From<CommandKind> for EventKind {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::ShellCommand => Self::ShellCommand,
            CommandKind::TimeoutInterrupt => Self::TimeoutInterrupt,
        }
    }
}

/// One immutable record of an attempted action and its outcome.
///
/// `command` and `output` are present if and only if the kind is
/// `shell_command` or `timeout_interrupt`; the constructors enforce this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    /// What was attempted.
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Failure message; empty means success.
    pub error: String,
    /// When the step completed.
    pub timestamp: DateTime<Utc>,
    /// Oracle-supplied rationale for the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The command that ran (command events only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Captured output (command events only, size-bounded by the log).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl StepEvent {
    /// Record a non-command step. `error` empty means success.
    #[must_use]
    pub fn record(kind: EventKind, error: impl Into<String>) -> Self {
        debug_assert!(
            !kind.carries_command(),
            "command events must use command_record"
        );
        Self {
            kind,
            error: error.into(),
            timestamp: Utc::now(),
            description: None,
            command: None,
            output: None,
        }
    }

    /// Record a command step with the command that ran and its output.
    #[must_use]
    pub fn command_record(
        kind: CommandKind,
        command: impl Into<String>,
        output: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            error: error.into(),
            timestamp: Utc::now(),
            description: None,
            command: Some(command.into()),
            output: Some(output.into()),
        }
    }

    /// Attach the oracle's rationale.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

//! Traits at the engine's two seams: the shell driver and the oracle.
//!
//! Every session primitive returns a tagged outcome rather than a bare
//! boolean, so call sites match exhaustively instead of branching on
//! response shape.

use std::time::Duration;

use async_trait::async_trait;

use crate::action::NextAction;
use crate::error::{OracleError, SessionError};
use crate::event::StepEvent;

/// Outcome of a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Transport authenticated and shell opened.
    Connected,
    /// A transport was already open; nothing was done.
    AlreadyConnected,
}

/// Outcome of a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Shell (if any) and transport were closed.
    Disconnected,
    /// No transport was open; nothing was done.
    NotConnected,
}

/// Outcome of opening the shell channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCreateOutcome {
    /// A fresh shell channel is open and drained.
    Created,
    /// A shell was already open; nothing was done.
    AlreadyOpen,
}

/// Outcome of closing the shell channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseShellOutcome {
    /// The shell channel was closed and cleared.
    Closed,
    /// No shell was open; distinguishable no-op, not a failure.
    NothingToClose,
}

/// Outcome of sending an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The interrupt byte was written to the shell.
    Sent,
    /// No shell is open to interrupt.
    NoShell,
}

/// Outcome of running one command on the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A completion signal was detected; `output` is sanitized.
    Completed {
        /// Sanitized command output.
        output: String,
    },
    /// No completion signal arrived within the budget. One interrupt byte
    /// was sent, but the remote process may still be running.
    TimedOut {
        /// Sanitized output captured before the interrupt.
        output: String,
        /// The budget that expired.
        timeout: Duration,
    },
}

impl CommandOutcome {
    /// The captured output, complete or partial.
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Completed { output } | Self::TimedOut { output, .. } => output,
        }
    }

    /// Error text for the step event; empty for a completed command.
    #[must_use]
    pub fn error_message(&self) -> String {
        match self {
            Self::Completed { .. } => String::new(),
            Self::TimedOut { timeout, .. } => {
                format!("Command timed out after {} seconds", timeout.as_secs())
            }
        }
    }
}

/// The session primitives the controller dispatches to.
///
/// Implemented by the russh-backed `ShellSession`; tests substitute a
/// scripted driver.
#[async_trait]
pub trait ShellDriver: Send {
    /// Authenticate and open the shell. No-op success when connected.
    ///
    /// # Errors
    /// Returns [`SessionError`] on connection or authentication failure.
    async fn connect(&mut self) -> Result<ConnectOutcome, SessionError>;

    /// Close the shell (if open) then the transport. Tolerant of being
    /// called while already disconnected.
    async fn disconnect(&mut self) -> DisconnectOutcome;

    /// Open the interactive shell channel. No-op success when open.
    ///
    /// # Errors
    /// Returns [`SessionError`] if the channel cannot be opened.
    async fn create_shell(&mut self) -> Result<ShellCreateOutcome, SessionError>;

    /// Close the shell channel. Idempotent.
    async fn close_shell(&mut self) -> CloseShellOutcome;

    /// Run `command` on the shell, waiting up to `timeout` for completion.
    ///
    /// # Errors
    /// Returns [`SessionError::ShellUnavailable`] when no shell exists and
    /// one cannot be created; timeouts are a [`CommandOutcome`], not an
    /// error.
    async fn send_command(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutcome, SessionError>;

    /// Send the interrupt byte (Ctrl+C) to the shell.
    async fn interrupt(&mut self) -> Result<InterruptOutcome, SessionError>;
}

/// External decision service driving the session.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Propose the next action from the bounded history text.
    ///
    /// # Errors
    /// Returns [`OracleError`] on transport failure or a schema-invalid
    /// response.
    async fn next_action(&self, bounded_history: &str) -> Result<NextAction, OracleError>;

    /// Produce a free-text report of a sequence of events.
    ///
    /// # Errors
    /// Returns [`OracleError`] if the summarization call fails.
    async fn summarize(&self, events: &[StepEvent]) -> Result<String, OracleError>;
}

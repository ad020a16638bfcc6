//! Structured actions proposed by the oracle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::event::EventKind;

/// Command timeout applied when the oracle omits one.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

const fn default_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// A shell command with its execution time budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The command line to run.
    pub content: String,
    /// Seconds before the engine interrupts the command.
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

impl CommandSpec {
    /// The time budget as a [`Duration`].
    #[must_use]
    pub const fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// One action the oracle proposes the engine take next.
///
/// `command` is present only for `shell_command`; [`NextAction::validate`]
/// rejects any other shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextAction {
    /// Which session primitive to invoke.
    pub event: EventKind,
    /// Rationale for the choice; carried onto the resulting step event.
    pub description: String,
    /// Error text the oracle wants recorded; usually empty.
    #[serde(default)]
    pub error: String,
    /// The command to run, for `shell_command` actions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandSpec>,
}

impl NextAction {
    /// Check the command-presence rule.
    ///
    /// # Errors
    /// Returns [`OracleError::InvalidResponse`] when a `shell_command`
    /// action has no command, or a non-command action carries one.
    pub fn validate(self) -> Result<Self, OracleError> {
        match (self.event, self.command.is_some()) {
            (EventKind::ShellCommand, false) => Err(OracleError::InvalidResponse(
                "shell_command action without a command".to_string(),
            )),
            (EventKind::ShellCommand, true) => Ok(self),
            (kind, true) => Err(OracleError::InvalidResponse(format!(
                "{kind:?} action must not carry a command"
            ))),
            (_, false) => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shell_command_action() {
        let json = r#"{
            "event": "shell_command",
            "description": "list the home directory",
            "error": "",
            "command": {"content": "ls -la", "timeout": 10}
        }"#;
        let action: NextAction = serde_json::from_str(json).unwrap();
        let action = action.validate().unwrap();
        let command = action.command.unwrap();
        assert_eq!(command.content, "ls -la");
        assert_eq!(command.timeout_duration(), Duration::from_secs(10));
    }

    #[test]
    fn omitted_timeout_defaults() {
        let json = r#"{
            "event": "shell_command",
            "description": "check uptime",
            "command": {"content": "uptime"}
        }"#;
        let action: NextAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action.command.unwrap().timeout,
            DEFAULT_COMMAND_TIMEOUT_SECS
        );
    }

    #[test]
    fn shell_command_without_command_is_invalid() {
        let json = r#"{"event": "shell_command", "description": "oops"}"#;
        let action: NextAction = serde_json::from_str(json).unwrap();
        assert!(matches!(
            action.validate(),
            Err(OracleError::InvalidResponse(_))
        ));
    }

    #[test]
    fn command_on_non_command_action_is_invalid() {
        let json = r#"{
            "event": "connect",
            "description": "reconnect first",
            "command": {"content": "ls"}
        }"#;
        let action: NextAction = serde_json::from_str(json).unwrap();
        assert!(matches!(
            action.validate(),
            Err(OracleError::InvalidResponse(_))
        ));
    }

    #[test]
    fn unknown_event_kind_fails_to_parse() {
        let json = r#"{"event": "reboot", "description": ""}"#;
        assert!(serde_json::from_str::<NextAction>(json).is_err());
    }
}

//! Wire types for the chat-completions endpoint.

use serde::{Deserialize, Serialize};

/// One request to `POST {base_url}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Conversation so far; this client only ever sends one message.
    pub messages: Vec<ChatMessage>,
    /// Optional structured-output constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
}

/// One chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    #[must_use]
    pub const fn system(content: String) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    /// A user-role message.
    #[must_use]
    pub const fn user(content: String) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// The slice of the chat-completions response this client reads.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// The first choice's content, if any arrived.
    #[must_use]
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .content
            .as_deref()
            .filter(|content| !content.is_empty())
    }
}

/// The `response_format` constraint forcing a [`NextAction`]-shaped reply.
///
/// [`NextAction`]: shell_pilot_core::NextAction
#[must_use]
pub fn action_response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "next_session_action",
            "schema": {
                "type": "object",
                "properties": {
                    "event": {
                        "type": "string",
                        "enum": [
                            "connect",
                            "disconnect",
                            "reconnect",
                            "shell_create",
                            "shell_close",
                            "shell_command",
                            "interrupt",
                            "timeout_interrupt"
                        ]
                    },
                    "description": {"type": "string"},
                    "error": {"type": "string"},
                    "command": {
                        "type": ["object", "null"],
                        "properties": {
                            "content": {"type": "string"},
                            "timeout": {"type": "integer"}
                        },
                        "required": ["content"],
                        "additionalProperties": false
                    }
                },
                "required": ["event", "description"],
                "additionalProperties": false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use shell_pilot_core::EventKind;

    use super::*;

    #[test]
    fn schema_enumerates_every_event_kind() {
        let schema = action_response_format();
        let allowed = schema["json_schema"]["schema"]["properties"]["event"]["enum"]
            .as_array()
            .unwrap()
            .clone();

        let kinds = [
            EventKind::Connect,
            EventKind::Disconnect,
            EventKind::Reconnect,
            EventKind::ShellCreate,
            EventKind::ShellClose,
            EventKind::ShellCommand,
            EventKind::Interrupt,
            EventKind::TimeoutInterrupt,
        ];
        assert_eq!(allowed.len(), kinds.len());
        for kind in kinds {
            let wire = serde_json::to_value(kind).unwrap();
            assert!(allowed.contains(&wire), "missing {wire} in schema enum");
        }
    }

    #[test]
    fn parses_a_chat_response() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"event\":\"connect\"}"}}]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_content(), Some("{\"event\":\"connect\"}"));
    }

    #[test]
    fn empty_choices_yield_no_content() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(response.first_content().is_none());

        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": ""}}]}"#).unwrap();
        assert!(response.first_content().is_none());
    }

    #[test]
    fn request_omits_absent_response_format() {
        let request = ChatRequest {
            model: "gpt-test",
            messages: vec![ChatMessage::user("hi".to_string())],
            response_format: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }
}

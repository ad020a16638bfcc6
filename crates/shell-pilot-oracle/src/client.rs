//! Chat-completions client implementing the oracle contract.

use async_trait::async_trait;
use shell_pilot_core::{NextAction, Oracle, OracleError, StepEvent, history::render_events};

use crate::prompt::render_system_prompt;
use crate::wire::{ChatMessage, ChatRequest, ChatResponse, action_response_format};

/// Default endpoint, overridable for compatible providers.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Endpoint credentials and model selection for the oracle.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Bearer token for the endpoint.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// API base URL, without a trailing slash.
    pub base_url: String,
}

impl OracleConfig {
    /// Config against the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint.
///
/// Next-action requests are constrained to the action JSON schema;
/// summarization is a plain unconstrained call. The engine only checks
/// response shape, never the reasoning behind it.
pub struct OpenAiOracle {
    http: reqwest::Client,
    config: OracleConfig,
    system_template: String,
}

impl OpenAiOracle {
    /// Create a client with the system prompt template to render per call.
    #[must_use]
    pub fn new(config: OracleConfig, system_template: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            system_template,
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        body.first_content()
            .map(str::to_string)
            .ok_or(OracleError::Empty)
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn next_action(&self, bounded_history: &str) -> Result<NextAction, OracleError> {
        let system_prompt = render_system_prompt(&self.system_template, bounded_history);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::system(system_prompt)],
            response_format: Some(action_response_format()),
        };

        let content = self.chat(&request).await?;
        tracing::debug!(model = %self.config.model, "oracle proposed: {content}");

        let action: NextAction = serde_json::from_str(&content)
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        action.validate()
    }

    async fn summarize(&self, events: &[StepEvent]) -> Result<String, OracleError> {
        let prompt = format!(
            "The following is the event log of a remote shell session:\n{}\n\n\
             Write a report summarizing this history.",
            render_events(events),
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::user(prompt)],
            response_format: None,
        };

        self.chat(&request).await
    }
}

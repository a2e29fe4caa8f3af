//! OpenAI-compatible chat client.
//!
//! Covers Groq and any other service exposing a `/chat/completions`
//! endpoint. Non-streaming only — the honeypot returns one reply per
//! inbound message, so there is nothing to stream.

use mellivora_config::ProviderConfig;
use mellivora_core::error::{ClassifierError, ReplyError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Transport-level failures of a chat completion call. Mapped into the
/// collaborator error types at each call site.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No choices in response")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<ChatError> for ClassifierError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Api {
                status_code,
                message,
            } => ClassifierError::Api {
                status_code,
                message,
            },
            ChatError::RateLimited { retry_after_secs } => {
                ClassifierError::RateLimited { retry_after_secs }
            }
            ChatError::AuthenticationFailed(m) => ClassifierError::AuthenticationFailed(m),
            ChatError::Network(m) => ClassifierError::Network(m),
            ChatError::EmptyResponse => {
                ClassifierError::MalformedOutput("no choices in response".into())
            }
            ChatError::NotConfigured(m) => ClassifierError::NotConfigured(m),
        }
    }
}

impl From<ChatError> for ReplyError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Api {
                status_code,
                message,
            } => ReplyError::Api {
                status_code,
                message,
            },
            ChatError::RateLimited { retry_after_secs } => {
                ReplyError::RateLimited { retry_after_secs }
            }
            ChatError::AuthenticationFailed(m) => ReplyError::AuthenticationFailed(m),
            ChatError::Network(m) => ReplyError::Network(m),
            ChatError::EmptyResponse => ReplyError::EmptyOutput,
            ChatError::NotConfigured(m) => ReplyError::NotConfigured(m),
        }
    }
}

/// One chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a strict JSON object response
    pub json_mode: bool,
}

/// A thin client over an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Build a client from configuration. Fails when no provider key is
    /// configured — the gateway refuses to start without one.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ChatError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ChatError::NotConfigured("no provider API key (set GROQ_API_KEY)".into())
        })?;

        Ok(Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            config.request_timeout_secs,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request, returning the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        if request.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        debug!(model = %self.model, json_mode = request.json_mode, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ChatError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ChatError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ChatError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| ChatError::Api {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse)?
            .message
            .content
            .unwrap_or_default();

        Ok(content)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

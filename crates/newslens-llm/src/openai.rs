//! OpenAI-compatible chat-completions provider
//!
//! Sends each prompt as a single user turn preceded by a fixed system
//! message, and maps HTTP and body-level problems onto [`FailureKind`].
//!
//! # Examples
//!
//! ```no_run
//! use newslens_llm::{OpenAiClient, OpenAiConfig};
//!
//! let config = OpenAiConfig {
//!     api_key: Some("sk-...".to_string()),
//!     ..OpenAiConfig::default()
//! };
//! let client = OpenAiClient::new(config).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use newslens_domain::{
    Completion, CompletionClient, CompletionFailure, CompletionOutcome, FailureKind,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a completion request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// System message sent ahead of every prompt
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant specialized in analyzing news articles.";

/// Provider settings, passed in at construction time
#[derive(Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API key; `None` leaves the client unconfigured
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL, without the `/chat/completions` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System message sent ahead of every prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            system_prompt: default_system_prompt(),
        }
    }
}

// Hand-written so the key never reaches a log line.
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl OpenAiConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("base_url must start with http:// or https://".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// True when a non-blank API key is present
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Chat-completions client
pub struct OpenAiClient {
    config: OpenAiConfig,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Create a client from `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built. A missing API key is not an error: the client is
    /// created and every call fails with `NotConfigured`.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    async fn send(&self, api_key: &str, prompt: &str, model: &str) -> CompletionOutcome {
        let request_body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!("Sending {} char prompt to {} ({})", prompt.len(), self.endpoint, model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| failure(FailureKind::ConnectionError, format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                failure(
                    FailureKind::ConnectionError,
                    format!("Reading response failed: {}", e),
                )
            })?;

        if !status.is_success() {
            return Err(status_failure(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_slice(&body).map_err(|e| {
            failure(
                FailureKind::UnexpectedFormat,
                format!("Failed to parse response: {}", e),
            )
        })?;

        first_completion(parsed)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str, model: &str) -> CompletionOutcome {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(failure(
                    FailureKind::NotConfigured,
                    "No API key configured for the completion provider",
                ))
            }
        };

        if prompt.trim().is_empty() {
            return Err(failure(FailureKind::UnexpectedFormat, "Refusing to send an empty prompt"));
        }

        let outcome = self.send(api_key, prompt, model).await;
        if let Err(e) = &outcome {
            warn!("Completion call failed: {}", e);
        }
        outcome
    }

    fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }
}

fn failure(kind: FailureKind, message: impl Into<String>) -> CompletionFailure {
    CompletionFailure::new(kind, message)
}

/// Classify a non-success HTTP status
fn status_failure(status: StatusCode, body: &[u8]) -> CompletionFailure {
    let detail = provider_message(body).unwrap_or_else(|| format!("HTTP {}", status));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => failure(
            FailureKind::AuthError,
            "Invalid API key or credentials",
        ),
        StatusCode::TOO_MANY_REQUESTS => failure(FailureKind::RateLimited, detail),
        _ => failure(
            FailureKind::ProviderError,
            format!("HTTP {}: {}", status.as_u16(), detail),
        ),
    }
}

/// Pull `error.message` out of a provider error body
fn provider_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

/// Take the first choice's content, trimmed
fn first_completion(response: ChatResponse) -> CompletionOutcome {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(failure(FailureKind::UnexpectedFormat, "Response contained no choices"));
    };

    let finish_reason = choice.finish_reason.unwrap_or_else(|| "unknown".to_string());
    let content = choice
        .message
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(failure(
            FailureKind::UnexpectedFormat,
            format!("Response had no content (finish reason: {})", finish_reason),
        ));
    }

    Ok(Completion {
        text: content,
        truncated: finish_reason == "length",
    })
}

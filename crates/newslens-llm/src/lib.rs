//! Newslens Completion Providers
//!
//! Implementations of the `CompletionClient` trait from `newslens-domain`.
//!
//! # Providers
//!
//! - `MockCompletionClient`: Deterministic double for tests, no network
//! - `OpenAiClient`: OpenAI-compatible chat-completions endpoint over HTTP
//!
//! # Examples
//!
//! ```
//! use newslens_llm::MockCompletionClient;
//! use newslens_domain::CompletionClient;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let client = MockCompletionClient::new("Hello from LLM!");
//! let completion = rt.block_on(client.complete("test prompt", "any-model")).unwrap();
//! assert_eq!(completion.text, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use newslens_domain::{
    Completion, CompletionClient, CompletionFailure, CompletionOutcome, FailureKind,
};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::{OpenAiClient, OpenAiConfig};

/// Errors raised while building a provider
#[derive(Error, Debug)]
pub enum LlmError {
    /// The underlying HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Invalid provider configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Scripted reply for prompts containing a marker
#[derive(Debug, Clone)]
enum MockReply {
    Text(Completion),
    Failure(CompletionFailure),
}

/// Mock completion client for deterministic testing
///
/// Replies are matched by substring: the first registered marker found in
/// the prompt decides the reply. Prompts matching no marker get the
/// default response.
///
/// # Examples
///
/// ```
/// use newslens_llm::MockCompletionClient;
/// use newslens_domain::{CompletionClient, FailureKind};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let mut client = MockCompletionClient::default();
/// client.add_response("summarize", "A summary.");
/// client.add_failure("Organizations:", FailureKind::RateLimited);
///
/// let summary = rt.block_on(client.complete("Please summarize this", "m")).unwrap();
/// assert_eq!(summary.text, "A summary.");
/// assert!(rt.block_on(client.complete("Organizations: ...", "m")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockCompletionClient {
    default_reply: MockReply,
    replies: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockCompletionClient {
    /// Create a mock that answers every prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_reply: MockReply::Text(Completion::new(response.into())),
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails every unmatched prompt with `kind`
    pub fn failing(kind: FailureKind) -> Self {
        let mut client = Self::new("");
        client.default_reply = MockReply::Failure(CompletionFailure::new(kind, "mock failure"));
        client
    }

    /// Reply with `response` to prompts containing `marker`
    pub fn add_response(&mut self, marker: impl Into<String>, response: impl Into<String>) {
        let reply = MockReply::Text(Completion::new(response.into()));
        lock(&self.replies).push((marker.into(), reply));
    }

    /// Reply with a truncated completion to prompts containing `marker`
    pub fn add_truncated_response(
        &mut self,
        marker: impl Into<String>,
        response: impl Into<String>,
    ) {
        lock(&self.replies).push((
            marker.into(),
            MockReply::Text(Completion::truncated(response.into())),
        ));
    }

    /// Fail prompts containing `marker` with `kind`
    pub fn add_failure(&mut self, marker: impl Into<String>, kind: FailureKind) {
        lock(&self.replies).push((
            marker.into(),
            MockReply::Failure(CompletionFailure::new(kind, "mock failure")),
        ));
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, prompt: &str, _model: &str) -> CompletionOutcome {
        lock(&self.prompts).push(prompt.to_string());

        let reply = lock(&self.replies)
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Text(completion) => Ok(completion),
            MockReply::Failure(failure) => Err(failure),
        }
    }
}

// A poisoned lock only means another test thread panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_default() {
        let client = MockCompletionClient::new("Test response");
        let result = client.complete("any prompt", "model").await;
        assert_eq!(result.unwrap().text, "Test response");
    }

    #[tokio::test]
    async fn test_mock_client_marker_responses() {
        let mut client = MockCompletionClient::default();
        client.add_response("hello", "world");
        client.add_response("foo", "bar");

        assert_eq!(client.complete("say hello", "m").await.unwrap().text, "world");
        assert_eq!(client.complete("foo!", "m").await.unwrap().text, "bar");
        assert_eq!(
            client.complete("unknown", "m").await.unwrap().text,
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_client_first_marker_wins() {
        let mut client = MockCompletionClient::default();
        client.add_response("alpha", "first");
        client.add_response("beta", "second");

        let result = client.complete("beta then alpha", "m").await.unwrap();
        assert_eq!(result.text, "first");
    }

    #[tokio::test]
    async fn test_mock_client_call_count() {
        let client = MockCompletionClient::new("test");
        assert_eq!(client.call_count(), 0);

        client.complete("prompt1", "m").await.unwrap();
        assert_eq!(client.call_count(), 1);

        client.complete("prompt2", "m").await.unwrap();
        assert_eq!(client.call_count(), 2);
        assert_eq!(client.prompts(), vec!["prompt1", "prompt2"]);

        client.reset_call_count();
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_client_failure() {
        let mut client = MockCompletionClient::default();
        client.add_failure("bad prompt", FailureKind::AuthError);

        let err = client.complete("a bad prompt", "m").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::AuthError);
    }

    #[tokio::test]
    async fn test_mock_client_failing_default() {
        let client = MockCompletionClient::failing(FailureKind::ConnectionError);
        let err = client.complete("anything", "m").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ConnectionError);
    }

    #[tokio::test]
    async fn test_mock_client_truncated() {
        let mut client = MockCompletionClient::default();
        client.add_truncated_response("long", "cut off");

        let result = client.complete("a long prompt", "m").await.unwrap();
        assert!(result.truncated);
        assert_eq!(result.text, "cut off");
    }

    #[tokio::test]
    async fn test_mock_client_clone_shares_state() {
        let client1 = MockCompletionClient::new("test");
        let client2 = client1.clone();

        client1.complete("test", "m").await.unwrap();

        assert_eq!(client1.call_count(), 1);
        assert_eq!(client2.call_count(), 1);
    }
}

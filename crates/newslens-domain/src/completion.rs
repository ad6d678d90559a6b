//! Outcome of a single call to an external completion endpoint

use std::fmt;
use thiserror::Error;

/// Successful completion text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// First choice's content, trimmed
    pub text: String,

    /// The provider cut the content off at a length limit.
    /// Callers still parse truncated text but should treat it as incomplete.
    pub truncated: bool,
}

impl Completion {
    /// A complete (non-truncated) completion
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: false,
        }
    }

    /// A completion the provider reported as truncated
    pub fn truncated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: true,
        }
    }
}

/// Classification of completion failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No credential is configured for the provider
    NotConfigured,
    /// Transport failure, including timeouts
    ConnectionError,
    /// Provider rejected the call for exceeding a rate limit
    RateLimited,
    /// Provider rejected the credential
    AuthError,
    /// Any other non-success status from the provider
    ProviderError,
    /// Success status, but no usable content in the body
    UnexpectedFormat,
}

impl FailureKind {
    /// Stable snake_case label, used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotConfigured => "not_configured",
            FailureKind::ConnectionError => "connection_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::AuthError => "auth_error",
            FailureKind::ProviderError => "provider_error",
            FailureKind::UnexpectedFormat => "unexpected_format",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed completion call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CompletionFailure {
    /// What went wrong
    pub kind: FailureKind,
    /// Human-readable detail, never contains credentials
    pub message: String,
}

impl CompletionFailure {
    /// Create a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result of one completion call
pub type CompletionOutcome = Result<Completion, CompletionFailure>;

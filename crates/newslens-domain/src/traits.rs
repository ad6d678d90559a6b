//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the analysis pipeline and
//! infrastructure. Implementations live in other crates.

use crate::{AnalysisRecord, CompletionOutcome, NewAnalysisRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Trait for calling an external text-completion endpoint
///
/// Implemented by the infrastructure layer (newslens-llm).
/// Implementations must not retry internally; retry policy belongs to the caller.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `prompt` with `model`, returning trimmed text or a typed failure
    async fn complete(&self, prompt: &str, model: &str) -> CompletionOutcome;

    /// Whether a credential is present (used for health reporting)
    fn is_configured(&self) -> bool {
        true
    }
}

/// Errors reported by side-effect collaborators.
///
/// These are logged by the caller and never turned into request failures.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// Object storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persistence failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Trait for storing uploaded files
///
/// Implemented by the infrastructure layer (newslens-store)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` and return the opaque key it was stored under
    async fn put(
        &self,
        bytes: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> Result<String, CollaboratorError>;
}

/// Trait for persisting analysis results
///
/// Implemented by the infrastructure layer (newslens-store).
/// Methods are blocking; async callers should run them on a blocking thread.
pub trait AnalysisRepository: Send + Sync {
    /// Persist a record and return its id
    fn save(&self, record: &NewAnalysisRecord) -> Result<i64, CollaboratorError>;

    /// Fetch a record by id
    fn get(&self, id: i64) -> Result<Option<AnalysisRecord>, CollaboratorError>;
}

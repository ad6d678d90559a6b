//! Newslens Domain Layer
//!
//! This crate holds the data model shared by every other Newslens crate and
//! the trait interfaces for the collaborators the analysis pipeline talks to.
//!
//! ## Key Concepts
//!
//! - **AnalysisResult**: summary plus nationalities, organizations and people
//!   extracted from one article. Each field degrades independently.
//! - **Completion**: the outcome of one call to an external completion
//!   endpoint, either text (possibly truncated) or a typed failure.
//! - **AnalysisRecord**: an analysis persisted alongside its upload metadata.
//!
//! ## Architecture
//!
//! - Pure data and traits only, no I/O
//! - Infrastructure implementations live in `newslens-llm` and `newslens-store`
//! - The orchestrator in `newslens-analyzer` depends on the traits, never on
//!   a concrete provider

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod completion;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use analysis::AnalysisResult;
pub use completion::{Completion, CompletionFailure, CompletionOutcome, FailureKind};
pub use record::{AnalysisRecord, NewAnalysisRecord};
pub use traits::{AnalysisRepository, CollaboratorError, CompletionClient, ObjectStore};

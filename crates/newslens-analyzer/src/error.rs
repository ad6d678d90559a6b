//! Error types for the Analyzer

use thiserror::Error;

/// Input rejected before any completion call is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Text is empty after trimming
    #[error("Input text is empty")]
    Empty,

    /// Text exceeds maximum length
    #[error("Input text is too long: {0} chars (max: {1})")]
    TooLong(usize, usize),
}

//! Persisted analysis records

use crate::AnalysisResult;
use serde::{Deserialize, Serialize};

/// An analysis about to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnalysisRecord {
    /// Name of the uploaded file, when the input was a file
    pub original_filename: Option<String>,

    /// Object-store key of the uploaded file, when the upload succeeded
    pub object_key: Option<String>,

    /// The analysis itself
    pub result: AnalysisResult,
}

/// A stored analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Store-assigned identifier
    pub id: i64,

    /// Name of the uploaded file, when the input was a file
    pub original_filename: Option<String>,

    /// Object-store key of the uploaded file
    pub object_key: Option<String>,

    /// The analysis itself
    pub result: AnalysisResult,

    /// Creation time (Unix seconds)
    pub created_at: u64,
}

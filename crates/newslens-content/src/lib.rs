//! Newslens Content Extraction
//!
//! Turns uploaded `.txt` and `.docx` files into plain article text.
//!
//! - `.txt`: UTF-8, falling back to Latin-1
//! - `.docx`: body paragraphs of `word/document.xml`, joined with newlines
//!
//! # Examples
//!
//! ```
//! use newslens_content::{extract, FileKind};
//!
//! let text = extract("article.TXT", b"Paris hosted the summit.").unwrap();
//! assert_eq!(text, "Paris hosted the summit.");
//! assert_eq!(FileKind::from_filename("notes.docx"), Some(FileKind::Docx));
//! ```

#![warn(missing_docs)]

mod docx;
mod txt;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// MIME type of a Word document
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of a plain-text file
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Errors raised while extracting text from an upload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Extension is neither `.txt` nor `.docx`
    #[error("Invalid file type for '{0}'. Only .txt and .docx are supported.")]
    UnsupportedFileType(String),

    /// Zero-byte upload
    #[error("Uploaded file '{0}' appears to be empty.")]
    EmptyFile(String),

    /// Text file is neither UTF-8 nor Latin-1
    #[error("Could not decode .txt file '{filename}'. Ensure it's UTF-8 or Latin-1 encoded. {reason}")]
    Decode {
        /// Uploaded file name
        filename: String,
        /// What went wrong
        reason: String,
    },

    /// Not a readable Word document
    #[error("Could not parse the .docx file '{filename}'. It might be corrupted or not a valid Word document. {reason}")]
    CorruptDocument {
        /// Uploaded file name
        filename: String,
        /// What went wrong
        reason: String,
    },
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Plain text
    Text,
    /// Word document
    Docx,
}

impl FileKind {
    /// Kind from the file extension, case-insensitive
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = Path::new(filename).extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("txt") {
            Some(FileKind::Text)
        } else if extension.eq_ignore_ascii_case("docx") {
            Some(FileKind::Docx)
        } else {
            None
        }
    }

    /// Kind from a MIME type; parameters such as `charset` are ignored
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(TEXT_CONTENT_TYPE) {
            Some(FileKind::Text)
        } else if essence.eq_ignore_ascii_case(DOCX_CONTENT_TYPE) {
            Some(FileKind::Docx)
        } else {
            None
        }
    }

    /// Canonical MIME type
    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Text => TEXT_CONTENT_TYPE,
            FileKind::Docx => DOCX_CONTENT_TYPE,
        }
    }

    /// Lowercase extension including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Text => ".txt",
            FileKind::Docx => ".docx",
        }
    }
}

/// Extract the article text from an uploaded file
///
/// The returned text is not trimmed or length-checked; that is up to the
/// analyzer's input validation.
pub fn extract(filename: &str, bytes: &[u8]) -> Result<String, ContentError> {
    let kind = FileKind::from_filename(filename)
        .ok_or_else(|| ContentError::UnsupportedFileType(filename.to_string()))?;

    if bytes.is_empty() {
        return Err(ContentError::EmptyFile(filename.to_string()));
    }

    debug!("Extracting {:?} content from '{}' ({} bytes)", kind, filename, bytes.len());

    let text = match kind {
        FileKind::Text => txt::decode(filename, bytes)?,
        FileKind::Docx => docx::extract_text(filename, bytes)?,
    };

    debug!("Extracted {} chars from '{}'", text.chars().count(), filename);
    Ok(text)
}

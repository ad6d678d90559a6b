//! Newslens Analyzer
//!
//! Turns a news article into a summary plus the nationalities, organizations
//! and people it mentions, using three prompt-templated completion calls.
//!
//! # Architecture
//!
//! ```text
//!          ┌─ Summary prompt ──────► completion ─► parse_summary  ─┐
//! Text ────┼─ Nationalities prompt ► completion ─► parse_list     ─┼─► AnalysisResult
//!          └─ Entities prompt ─────► completion ─► parse_entities ─┘
//! ```
//!
//! # Key Features
//!
//! - **Failure isolation**: a failed sub-task degrades only its own field
//! - **Strict parsing**: label/colon/comma-list grammar with "no match"
//!   reported separately from "nothing found"
//! - **Injected client**: any `CompletionClient`, so tests run offline
//!
//! # Example Usage
//!
//! ```no_run
//! use newslens_analyzer::{Analyzer, AnalyzerConfig};
//! use newslens_llm::MockCompletionClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(MockCompletionClient::new("None"));
//! let analyzer = Analyzer::new(client, AnalyzerConfig::default());
//!
//! let text = analyzer.validate_input("  Paris hosted the summit.  ")?;
//! let result = analyzer.analyze(text).await?;
//!
//! println!("Summary: {:?}", result.summary);
//! println!("Nationalities: {:?}", result.nationalities);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
pub mod parser;
pub mod prompt;


pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use error::InputError;
pub use parser::{EntityOutcome, EntityParse, ListOutcome, ListParse};
pub use prompt::PromptKind;

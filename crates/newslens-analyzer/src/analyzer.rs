//! Core Analyzer implementation

use crate::config::AnalyzerConfig;
use crate::error::InputError;
use crate::parser::{parse_entities, parse_list, parse_summary, EntityOutcome, ListOutcome};
use crate::prompt::PromptKind;
use newslens_domain::{
    AnalysisResult, CompletionClient, CompletionFailure, CompletionOutcome, FailureKind,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Longest slice of a raw response quoted in a log line
const LOG_EXCERPT_CHARS: usize = 200;

/// The Analyzer runs the summary, nationality and entity sub-tasks for an article
pub struct Analyzer {
    client: Arc<dyn CompletionClient>,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create a new Analyzer around an injected completion client
    pub fn new(client: Arc<dyn CompletionClient>, config: AnalyzerConfig) -> Self {
        Self { client, config }
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Whether the completion client has a credential
    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Trim `text` and check it against the empty and length limits
    ///
    /// Length is counted in characters, not bytes.
    pub fn validate_input<'a>(&self, text: &'a str) -> Result<&'a str, InputError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(InputError::Empty);
        }

        let length = trimmed.chars().count();
        if length > self.config.max_text_length {
            return Err(InputError::TooLong(length, self.config.max_text_length));
        }

        Ok(trimmed)
    }

    /// Analyze an article
    ///
    /// `text` is expected to have passed [`Analyzer::validate_input`]; only
    /// emptiness is re-checked here. Completion failures never surface as
    /// errors: each one empties its own field and the remaining sub-tasks
    /// still run.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, InputError> {
        if text.trim().is_empty() {
            return Err(InputError::Empty);
        }

        let start_time = Instant::now();
        info!(
            "Starting analysis with model '{}', text length {} chars",
            self.config.model,
            text.chars().count()
        );

        let summary = self.summarize(text).await;
        let nationalities = self.extract_nationalities(text).await;
        let (organizations, people) = self.extract_entities(text).await;

        let result = AnalysisResult {
            summary,
            nationalities,
            organizations,
            people,
        };

        info!(
            "Analysis complete in {}ms: summary {}, {} nationalities, {} organizations, {} people",
            start_time.elapsed().as_millis(),
            if result.summary.is_some() { "present" } else { "missing" },
            result.nationalities.len(),
            result.organizations.len(),
            result.people.len()
        );

        Ok(result)
    }

    async fn summarize(&self, text: &str) -> Option<String> {
        match self.complete(PromptKind::Summary, text).await {
            Ok(completion) => {
                let summary = parse_summary(&completion.text);
                if summary.is_none() {
                    warn!(
                        "Summary response unusable, no summary available: {:?}",
                        excerpt(&completion.text)
                    );
                }
                summary
            }
            Err(failure) => {
                degraded(PromptKind::Summary, &failure);
                None
            }
        }
    }

    async fn extract_nationalities(&self, text: &str) -> Vec<String> {
        match self.complete(PromptKind::Nationalities, text).await {
            Ok(completion) => {
                let parse = parse_list(&completion.text);
                match parse.outcome {
                    ListOutcome::Parsed => debug!("Parsed {} nationalities", parse.items.len()),
                    ListOutcome::NoneReported => debug!("No nationalities reported"),
                    ListOutcome::ErrorSentinel => warn!(
                        "Nationality response was an error sentinel: {:?}",
                        excerpt(&completion.text)
                    ),
                }
                parse.items
            }
            Err(failure) => {
                degraded(PromptKind::Nationalities, &failure);
                Vec::new()
            }
        }
    }

    async fn extract_entities(&self, text: &str) -> (Vec<String>, Vec<String>) {
        match self.complete(PromptKind::Entities, text).await {
            Ok(completion) => {
                let parse = parse_entities(&completion.text);
                match parse.outcome {
                    EntityOutcome::Parsed => debug!(
                        "Parsed {} organizations and {} people",
                        parse.organizations.len(),
                        parse.people.len()
                    ),
                    EntityOutcome::NoneReported => debug!("No entities reported"),
                    EntityOutcome::Unrecognized => warn!(
                        "Entity response matched neither label, treating as no entities: {:?}",
                        excerpt(&completion.text)
                    ),
                    EntityOutcome::ErrorSentinel => warn!(
                        "Entity response was an error sentinel: {:?}",
                        excerpt(&completion.text)
                    ),
                }
                (parse.organizations, parse.people)
            }
            Err(failure) => {
                degraded(PromptKind::Entities, &failure);
                (Vec::new(), Vec::new())
            }
        }
    }

    /// Build the prompt for `kind` and call the client under the configured timeout
    async fn complete(&self, kind: PromptKind, text: &str) -> CompletionOutcome {
        let prompt = kind.build(text);
        debug!("Running {} sub-task, prompt length {} chars", kind, prompt.len());

        let completion = timeout(
            self.config.completion_timeout(),
            self.client.complete(&prompt, &self.config.model),
        )
        .await
        .map_err(|_| {
            CompletionFailure::new(
                FailureKind::ConnectionError,
                format!(
                    "Completion timed out after {}s",
                    self.config.completion_timeout_secs
                ),
            )
        })??;

        debug!("{} response length {} chars", kind, completion.text.len());

        if completion.truncated {
            warn!("{} response was truncated by the provider, parsing partial output", kind);
        }

        Ok(completion)
    }
}

fn degraded(kind: PromptKind, failure: &CompletionFailure) {
    warn!(
        "{} sub-task failed ({}), field degraded: {}",
        kind, failure.kind, failure.message
    );
}

fn excerpt(text: &str) -> String {
    text.chars().take(LOG_EXCERPT_CHARS).collect()
}

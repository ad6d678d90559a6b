//! The structured result of analysing one article

use serde::{Deserialize, Serialize};

/// Summary and named entities extracted from a single article.
///
/// Every field is filled by its own sub-task. When a sub-task fails its
/// field holds the empty value (`None` or `[]`) while the others keep
/// whatever their sub-task produced.
///
/// The three lists are deduplicated and sorted by the parsers that build
/// them; this type does not re-normalize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short summary of the article, if one could be produced
    pub summary: Option<String>,

    /// Nationalities, countries and demonyms mentioned
    #[serde(default)]
    pub nationalities: Vec<String>,

    /// Organizations mentioned
    #[serde(default)]
    pub organizations: Vec<String>,

    /// People mentioned
    #[serde(default)]
    pub people: Vec<String>,
}

impl AnalysisResult {
    /// A result where every field is degraded
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no sub-task contributed anything
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.nationalities.is_empty()
            && self.organizations.is_empty()
            && self.people.is_empty()
    }
}

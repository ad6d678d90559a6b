//! Prompt templates for the three analysis sub-tasks
//!
//! Every template embeds the article verbatim between `"""` delimiters and
//! ends with an answer cue that pins down the expected output shape.

use std::fmt;

/// The three analysis sub-tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// 2-4 sentence summary
    Summary,
    /// Comma-separated nationalities, countries and demonyms
    Nationalities,
    /// Two labeled lines of organizations and people
    Entities,
}

impl PromptKind {
    /// All sub-tasks in the order the analyzer runs them
    pub const ALL: [PromptKind; 3] = [
        PromptKind::Summary,
        PromptKind::Nationalities,
        PromptKind::Entities,
    ];

    /// Build the complete prompt for `text`
    pub fn build(&self, text: &str) -> String {
        let mut prompt = String::with_capacity(text.len() + 1024);

        prompt.push_str(self.instructions());
        prompt.push_str("\n\n");

        prompt.push_str("Article:\n");
        prompt.push_str("\"\"\"\n");
        prompt.push_str(text);
        prompt.push_str("\n\"\"\"\n\n");

        prompt.push_str(self.answer_cue());
        prompt.push('\n');

        prompt
    }

    /// The closing line(s) the model is expected to complete
    pub fn answer_cue(&self) -> &'static str {
        match self {
            PromptKind::Summary => SUMMARY_CUE,
            PromptKind::Nationalities => NATIONALITIES_CUE,
            PromptKind::Entities => ENTITIES_CUE,
        }
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Summary => "summary",
            PromptKind::Nationalities => "nationalities",
            PromptKind::Entities => "entities",
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            PromptKind::Summary => SUMMARY_INSTRUCTIONS,
            PromptKind::Nationalities => NATIONALITIES_INSTRUCTIONS,
            PromptKind::Entities => ENTITIES_INSTRUCTIONS,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SUMMARY_INSTRUCTIONS: &str = "Please summarize the following news article in 2-4 concise sentences. \
Focus on the main events and key entities involved.";

const SUMMARY_CUE: &str = "Concise Summary:";

const NATIONALITIES_INSTRUCTIONS: &str = r#"Analyze the following news article. List all explicitly mentioned nationalities (e.g., French, Canadian), countries (e.g., Germany, Japan), or demonyms referring to peoples of specific nations (e.g., the British, Americans).
Provide the output ONLY as a comma-separated list.
If no relevant terms are found, respond ONLY with the word "None". Do not add explanations."#;

const NATIONALITIES_CUE: &str = "Nationalities/Countries mentioned (comma-separated list or None):";

const ENTITIES_INSTRUCTIONS: &str = r#"Analyze the news article below. Identify and extract:
1. Organizations: Companies, political parties, NGOs, government bodies, agencies (e.g., UN, NATO, FBI), specific military units if named.
2. People: Distinct individuals mentioned by full name or clearly identifiable name (e.g., President Biden, Ms. Ardern). Avoid generic titles without names.

Provide the output STRICTLY in the following format, with each list comma-separated.
If no entities are found for a category, write the word "None" for that category's list. Do not include any other text, labels, or explanations."#;

const ENTITIES_CUE: &str = "Organizations: [Comma-separated list of organizations or None]
People: [Comma-separated list of people or None]";

//! Parse completion text into structured analysis fields
//!
//! The model is asked for a fixed shape but nothing enforces it, so every
//! parser treats its input as untrusted text. List values are normalized
//! the same way everywhere: split on commas, trim, drop empties, dedupe
//! by exact (case-sensitive) match, sort by byte order.

use std::collections::BTreeSet;

/// Prefix marking text that reports a client-side failure instead of content
pub const ERROR_SENTINEL_PREFIX: &str = "Error:";

const NONE_TOKEN: &str = "none";
const ORGANIZATIONS_LABEL: &str = "organizations:";
const PEOPLE_LABEL: &str = "people:";

/// How a list response was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// At least one item was found
    Parsed,
    /// The model reported nothing (`None` or empty text)
    NoneReported,
    /// The text was an error sentinel and was discarded
    ErrorSentinel,
}

/// Result of parsing a comma-separated list response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParse {
    /// Normalized items
    pub items: Vec<String>,
    /// How the response was interpreted
    pub outcome: ListOutcome,
}

/// How an entity response was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    /// At least one label carried items
    Parsed,
    /// Labels were present but empty or `None`, or the whole reply was `None`
    NoneReported,
    /// Neither label appeared; the reply did not follow the requested format
    Unrecognized,
    /// The text was an error sentinel and was discarded
    ErrorSentinel,
}

/// Result of parsing an `Organizations:` / `People:` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityParse {
    /// Normalized organizations
    pub organizations: Vec<String>,
    /// Normalized people
    pub people: Vec<String>,
    /// How the response was interpreted
    pub outcome: EntityOutcome,
}

/// True when `raw` is an error sentinel rather than model output
pub fn is_error_sentinel(raw: &str) -> bool {
    raw.trim_start().starts_with(ERROR_SENTINEL_PREFIX)
}

/// Parse a summary response. `None` means no summary is available.
pub fn parse_summary(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_error_sentinel(trimmed) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a comma-separated list response (or `None`)
pub fn parse_list(raw: &str) -> ListParse {
    let trimmed = raw.trim();

    if is_error_sentinel(trimmed) {
        return ListParse {
            items: Vec::new(),
            outcome: ListOutcome::ErrorSentinel,
        };
    }

    let items = if is_none_token(trimmed) {
        Vec::new()
    } else {
        normalize_items(trimmed)
    };

    let outcome = if items.is_empty() {
        ListOutcome::NoneReported
    } else {
        ListOutcome::Parsed
    };

    ListParse { items, outcome }
}

/// Parse a two-line `Organizations: ...` / `People: ...` response
///
/// Lines are matched on a case-insensitive leading label; anything else is
/// ignored. A later label line with items replaces an earlier one.
pub fn parse_entities(raw: &str) -> EntityParse {
    let mut parse = EntityParse {
        organizations: Vec::new(),
        people: Vec::new(),
        outcome: EntityOutcome::NoneReported,
    };

    if is_error_sentinel(raw) {
        parse.outcome = EntityOutcome::ErrorSentinel;
        return parse;
    }

    let mut saw_label = false;

    for line in raw.lines().map(str::trim_start) {
        if let Some(rest) = strip_label(line, ORGANIZATIONS_LABEL) {
            saw_label = true;
            if let Some(items) = label_items(rest) {
                parse.organizations = items;
            }
        } else if let Some(rest) = strip_label(line, PEOPLE_LABEL) {
            saw_label = true;
            if let Some(items) = label_items(rest) {
                parse.people = items;
            }
        }
    }

    parse.outcome = if !parse.organizations.is_empty() || !parse.people.is_empty() {
        EntityOutcome::Parsed
    } else if saw_label || raw.trim().is_empty() || is_none_token(raw.trim()) {
        EntityOutcome::NoneReported
    } else {
        EntityOutcome::Unrecognized
    };

    parse
}

/// Split on commas, trim, drop empties, dedupe and sort
pub fn normalize_items(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_none_token(text: &str) -> bool {
    text.eq_ignore_ascii_case(NONE_TOKEN)
}

/// Remainder of `line` after `label`, matched case-insensitively
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(&line[label.len()..])
    } else {
        None
    }
}

/// Items after a label, or `None` when the label says there are none
fn label_items(rest: &str) -> Option<Vec<String>> {
    let content = rest.trim();
    if content.is_empty() || is_none_token(content) {
        return None;
    }
    let items = normalize_items(content);
    (!items.is_empty()).then_some(items)
}

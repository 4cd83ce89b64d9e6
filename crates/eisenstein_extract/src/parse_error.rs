//! Structured diagnosis of a failed extraction.

use chrono::{DateTime, Utc};
use eisenstein_core::ExtractionMethod;
use serde::Serialize;

/// Broad class of extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// Nothing but whitespace
    #[display("empty_response")]
    EmptyResponse,
    /// No `{` or `[` anywhere
    #[display("no_json_found")]
    NoJsonFound,
    /// Brackets or a code fence were opened and never closed
    #[display("truncated")]
    Truncated,
    /// JSON-like text that no strategy could parse
    #[display("malformed_json")]
    MalformedJson,
}

/// Everything known about why extraction failed.
///
/// Always carries the complete original text, at least one attempted method,
/// at least one failure reason and at least one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters, derive_more::Display)]
#[serde(rename_all = "camelCase")]
#[display("{kind}: {message}")]
pub struct ParseError {
    /// Failure class
    #[serde(rename = "type")]
    kind: ParseErrorKind,
    /// Specific description of what went wrong
    message: String,
    /// The full, untruncated model output
    original_content: String,
    /// Length of the model output in characters
    content_length: usize,
    /// Strategies tried, in order
    attempted_methods: Vec<ExtractionMethod>,
    /// One entry per failed strategy, `METHOD: reason`
    failure_reasons: Vec<String>,
    /// What to change so the next response parses
    suggestions: Vec<String>,
    /// When the error was synthesised
    timestamp: DateTime<Utc>,
}

impl ParseError {
    pub(crate) fn new(
        kind: ParseErrorKind,
        message: String,
        original_content: &str,
        attempted_methods: Vec<ExtractionMethod>,
        mut failure_reasons: Vec<String>,
    ) -> Self {
        if failure_reasons.is_empty() {
            failure_reasons.push(message.clone());
        }
        Self {
            kind,
            suggestions: suggestions_for(kind),
            message,
            content_length: original_content.chars().count(),
            original_content: original_content.to_string(),
            attempted_methods,
            failure_reasons,
            timestamp: Utc::now(),
        }
    }
}

fn suggestions_for(kind: ParseErrorKind) -> Vec<String> {
    let specific = match kind {
        ParseErrorKind::EmptyResponse => {
            "The model returned no content; retry the request or check the provider's status"
        }
        ParseErrorKind::NoJsonFound => {
            "No JSON-like structure found; ask the model to answer with a JSON object holding a \"prompts\" array"
        }
        ParseErrorKind::Truncated => {
            "Response may be truncated; raise the output token limit or request fewer prompts"
        }
        ParseErrorKind::MalformedJson => {
            "JSON-like text could not be repaired; check for unquoted values or mismatched brackets"
        }
    };
    vec![
        specific.to_string(),
        "Ask for a single ```json fenced block with no commentary".to_string(),
    ]
}

//! Storyboard shape validation.

use eisenstein_core::{DEFAULT_MOOD, PromptSource, StoryboardDocument, StoryboardPrompt, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys models commonly use instead of `text`.
pub const TEXT_ALIASES: &[&str] = &["description", "prompt", "visual", "content"];

/// Keys models commonly use instead of `prompts`.
pub const PROMPT_ARRAY_ALIASES: &[&str] = &["sections", "scenes", "shots", "frames"];

/// Validation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct ValidatorConfig {
    /// Fewest words a prompt's text may have
    pub min_text_words: usize,
    /// Fewest non-whitespace characters a prompt's text may have
    pub min_text_chars: usize,
    /// Seconds between synthesised timestamps
    pub timestamp_spacing_secs: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_text_words: 2,
            min_text_chars: 10,
            timestamp_spacing_secs: 5,
        }
    }
}

/// A violation tied to one field, e.g. `prompts[2].text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path of the offending field
    pub field: String,
    /// What is wrong
    pub message: String,
    /// How to fix it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
        }
    }
}

/// Result of checking a value against the storyboard shape.
///
/// An invalid result always carries at least one error and one field error.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
    field_errors: Vec<FieldError>,
    warnings: Vec<String>,
    suggestions: Vec<String>,
}

impl ValidationResult {
    fn from_parts(field_errors: Vec<FieldError>, warnings: Vec<String>) -> Self {
        let errors = field_errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        let mut suggestions: Vec<String> = Vec::new();
        for suggestion in field_errors.iter().filter_map(|e| e.suggestion.as_ref()) {
            if !suggestions.contains(suggestion) {
                suggestions.push(suggestion.clone());
            }
        }
        Self {
            is_valid: field_errors.is_empty(),
            errors,
            field_errors,
            warnings,
            suggestions,
        }
    }

    /// True when no rule was violated.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// One line per violation.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Violations by field.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// Non-fatal observations, such as synthesised timestamps.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Deduplicated fixes drawn from the field errors.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Field error for a given path, if any.
    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.field_errors.iter().find(|e| e.field == field)
    }
}

/// Result of [`StoryboardValidator::validate_document`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The value describes a storyboard
    Valid(StoryboardDocument),
    /// The value violates at least one rule
    Invalid(ValidationResult),
}

/// Checks JSON values against the storyboard shape.
///
/// # Examples
///
/// ```
/// use eisenstein_extract::{StoryboardValidator, ValidationOutcome};
/// use serde_json::json;
///
/// let validator = StoryboardValidator::default();
///
/// let result = validator.validate_storyboard(&json!({"prompts": []}));
/// assert!(!result.is_valid());
/// assert_eq!(result.field_errors()[0].field, "prompts");
///
/// let doc = json!({"prompts": [{"text": "Rain on a neon street", "timestamp": "0:15"}]});
/// match validator.validate_document(&doc) {
///     ValidationOutcome::Valid(storyboard) => {
///         assert_eq!(storyboard.prompts()[0].timestamp.to_string(), "00:15");
///     }
///     ValidationOutcome::Invalid(result) => panic!("{:?}", result.errors()),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoryboardValidator {
    config: ValidatorConfig,
}

impl StoryboardValidator {
    /// Validator with explicit thresholds.
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Current thresholds.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check every rule and report all violations.
    #[tracing::instrument(skip(self, value))]
    pub fn validate_storyboard(&self, value: &Value) -> ValidationResult {
        let mut field_errors = Vec::new();
        let mut warnings = Vec::new();

        match value.as_object() {
            None => field_errors.push(FieldError::new(
                "$",
                format!("top-level value must be an object, found {}", type_name(value)),
                Some("Return an object of the form {\"prompts\": [...]}"),
            )),
            Some(object) => self.check_prompts(object, &mut field_errors, &mut warnings),
        }

        let result = ValidationResult::from_parts(field_errors, warnings);
        tracing::debug!(
            valid = result.is_valid(),
            errors = result.field_errors().len(),
            warnings = result.warnings().len(),
            "Validated storyboard"
        );
        result
    }

    /// Validate and, on success, convert into a [`StoryboardDocument`].
    pub fn validate_document(&self, value: &Value) -> ValidationOutcome {
        let result = self.validate_storyboard(value);
        if !result.is_valid() {
            return ValidationOutcome::Invalid(result);
        }
        for warning in result.warnings() {
            tracing::debug!(%warning, "Validation warning");
        }
        match self.to_document(value) {
            Some(doc) => ValidationOutcome::Valid(doc),
            None => ValidationOutcome::Invalid(ValidationResult::from_parts(
                vec![FieldError::new("prompts", "no usable prompts", None)],
                Vec::new(),
            )),
        }
    }

    /// Violations for a single prompt element.
    pub(crate) fn prompt_errors(&self, index: usize, element: &Value) -> (Vec<FieldError>, Vec<String>) {
        let path = format!("prompts[{}]", index);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let Some(prompt) = element.as_object() else {
            let suggestion = if element.is_string() {
                "Wrap the description as {\"text\": \"...\"}"
            } else {
                "Each prompt must be an object with a \"text\" field"
            };
            errors.push(FieldError::new(
                &path,
                format!("prompt must be an object, found {}", type_name(element)),
                Some(suggestion),
            ));
            return (errors, warnings);
        };

        self.check_text(&path, prompt, &mut errors);
        check_mood(&path, prompt, &mut errors);
        check_timestamp(&path, prompt, &mut errors, &mut warnings);
        check_confidence(&path, prompt, &mut errors);
        check_source(&path, prompt, &mut errors);
        (errors, warnings)
    }

    /// Convert an already valid value, normalising timestamps and moods.
    pub(crate) fn to_document(&self, value: &Value) -> Option<StoryboardDocument> {
        let prompts = value.get("prompts")?.as_array()?;
        let converted = prompts
            .iter()
            .enumerate()
            .map(|(index, element)| self.to_prompt(index, element))
            .collect::<Option<Vec<_>>>()?;
        StoryboardDocument::new(converted)
    }

    fn to_prompt(&self, index: usize, element: &Value) -> Option<StoryboardPrompt> {
        let text = element.get("text")?.as_str()?.trim().to_string();
        let mood = element
            .get("mood")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MOOD)
            .to_string();
        let timestamp = element
            .get("timestamp")
            .and_then(lenient_timestamp)
            .unwrap_or_else(|| Timestamp::sequential(index, self.config.timestamp_spacing_secs));

        Some(StoryboardPrompt {
            text,
            mood,
            timestamp,
            source: element
                .get("source")
                .and_then(Value::as_str)
                .and_then(PromptSource::from_name),
            confidence: element.get("confidence").and_then(Value::as_f64),
        })
    }

    fn check_prompts(
        &self,
        object: &Map<String, Value>,
        errors: &mut Vec<FieldError>,
        warnings: &mut Vec<String>,
    ) {
        let prompts = match object.get("prompts") {
            None | Some(Value::Null) => {
                let suggestion = missing_prompts_suggestion(object);
                errors.push(FieldError::new(
                    "prompts",
                    "required field is missing",
                    Some(suggestion.as_str()),
                ));
                return;
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                errors.push(FieldError::new(
                    "prompts",
                    format!("must be an array, found {}", type_name(other)),
                    Some("Use a list of prompt objects: \"prompts\": [{...}]"),
                ));
                return;
            }
        };

        if prompts.is_empty() {
            errors.push(FieldError::new(
                "prompts",
                "must contain at least one prompt",
                Some("Describe at least one scene"),
            ));
            return;
        }

        for (index, element) in prompts.iter().enumerate() {
            let (element_errors, element_warnings) = self.prompt_errors(index, element);
            errors.extend(element_errors);
            warnings.extend(element_warnings);
        }
    }

    fn check_text(&self, path: &str, prompt: &Map<String, Value>, errors: &mut Vec<FieldError>) {
        let field = format!("{}.text", path);
        let text = match prompt.get("text") {
            None | Some(Value::Null) => {
                let suggestion = TEXT_ALIASES
                    .iter()
                    .find(|alias| prompt.get(**alias).is_some_and(Value::is_string))
                    .map(|alias| format!("Rename \"{}\" to \"text\"", alias))
                    .unwrap_or_else(|| "Add a \"text\" field describing the scene".to_string());
                errors.push(FieldError::new(&field, "required field is missing", Some(suggestion.as_str())));
                return;
            }
            Some(Value::String(text)) => text.trim(),
            Some(other) => {
                errors.push(FieldError::new(
                    &field,
                    format!("must be a string, found {}", type_name(other)),
                    Some("Use a plain string for the scene description"),
                ));
                return;
            }
        };

        let words = text.split_whitespace().count();
        let chars = text.chars().filter(|c| !c.is_whitespace()).count();
        if words < self.config.min_text_words || chars < self.config.min_text_chars {
            errors.push(FieldError::new(
                &field,
                format!(
                    "too short ({} word(s), {} character(s)); need at least {} words and {} characters",
                    words, chars, self.config.min_text_words, self.config.min_text_chars
                ),
                Some("Describe the scene visually: subject, setting, lighting, framing"),
            ));
        }
    }
}

fn check_mood(path: &str, prompt: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    match prompt.get("mood") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(other) => errors.push(FieldError::new(
            format!("{}.mood", path),
            format!("must be a string, found {}", type_name(other)),
            Some("Use a single word or short phrase such as \"tense\""),
        )),
    }
}

fn check_timestamp(
    path: &str,
    prompt: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
    warnings: &mut Vec<String>,
) {
    let field = format!("{}.timestamp", path);
    match prompt.get("timestamp") {
        None | Some(Value::Null) => {
            warnings.push(format!("{} is missing; a sequential timestamp will be used", field));
        }
        Some(Value::String(text)) if Timestamp::is_well_formed(text) => {}
        Some(value @ (Value::String(_) | Value::Number(_))) => match lenient_timestamp(value) {
            Some(ts) => warnings.push(format!("{} normalised to {}", field, ts)),
            None => warnings.push(format!(
                "{} ({}) is not a timestamp; a sequential timestamp will be used",
                field, value
            )),
        },
        Some(other) => errors.push(FieldError::new(
            field,
            format!("must be a \"MM:SS\" string, found {}", type_name(other)),
            Some("Use zero-padded minutes and seconds, e.g. \"00:15\""),
        )),
    }
}

fn check_confidence(path: &str, prompt: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    match prompt.get("confidence") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) if n.as_f64().is_some_and(|c| (0.0..=1.0).contains(&c)) => {}
        Some(other) => errors.push(FieldError::new(
            format!("{}.confidence", path),
            format!("must be a number between 0 and 1, found {}", other),
            Some("Omit confidence or give a value between 0.0 and 1.0"),
        )),
    }
}

fn check_source(path: &str, prompt: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    match prompt.get("source") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) if PromptSource::from_name(name).is_some() => {}
        Some(other) => errors.push(FieldError::new(
            format!("{}.source", path),
            format!("must be one of model, fallback, reconstructed, manual; found {}", other),
            Some("Omit source or use one of the listed values"),
        )),
    }
}

fn missing_prompts_suggestion(object: &Map<String, Value>) -> String {
    if let Some(alias) = PROMPT_ARRAY_ALIASES.iter().find(|a| object.contains_key(**a)) {
        return format!("Rename \"{}\" to \"prompts\"", alias);
    }
    if object.contains_key("storyboard") {
        return "Move the contents of \"storyboard\" to the top level".to_string();
    }
    "Add a \"prompts\" array of scene objects".to_string()
}

fn lenient_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(text) => Timestamp::parse_lenient(text),
        Value::Number(n) => Timestamp::parse_lenient(&n.to_string()),
        _ => None,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> StoryboardValidator {
        StoryboardValidator::default()
    }

    #[test]
    fn test_top_level_must_be_object() {
        let result = validator().validate_storyboard(&json!([1, 2]));
        assert!(!result.is_valid());
        assert_eq!(result.field_errors()[0].field, "$");
    }

    #[test]
    fn test_degenerate_text_rejected() {
        let result = validator().validate_storyboard(&json!({"prompts": [{"text": "Sunset"}]}));
        assert!(result.field_error("prompts[0].text").is_some());
    }

    #[test]
    fn test_optional_fields_typed() {
        let result = validator().validate_storyboard(&json!({"prompts": [{
            "text": "A lighthouse in a gale, waves breaking",
            "mood": 3,
            "confidence": 1.5,
            "source": "robot"
        }]}));
        assert!(result.field_error("prompts[0].mood").is_some());
        assert!(result.field_error("prompts[0].confidence").is_some());
        assert!(result.field_error("prompts[0].source").is_some());
        assert_eq!(result.errors().len(), 3);
    }

    #[test]
    fn test_missing_timestamp_synthesised_with_warning() {
        let value = json!({"prompts": [
            {"text": "A lighthouse in a gale, waves breaking"},
            {"text": "Dawn over the calm harbour, gulls circling", "timestamp": "soon"}
        ]});
        let result = validator().validate_storyboard(&value);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 2);

        let ValidationOutcome::Valid(doc) = validator().validate_document(&value) else {
            panic!("expected valid storyboard");
        };
        assert_eq!(doc.prompts()[1].timestamp.to_string(), "00:05");
        assert_eq!(doc.prompts()[0].mood, DEFAULT_MOOD);
    }

    #[test]
    fn test_missing_text_suggests_alias_rename() {
        let result = validator()
            .validate_storyboard(&json!({"prompts": [{"description": "A crowded market at noon"}]}));
        let error = result.field_error("prompts[0].text").unwrap();
        assert_eq!(error.suggestion.as_deref(), Some("Rename \"description\" to \"text\""));
    }
}

//! Low-risk repairs for almost-valid storyboards.
//!
//! Repairs only move, rename or unwrap what the model produced. None of them
//! invents prompt text.

use crate::validation::{PROMPT_ARRAY_ALIASES, TEXT_ALIASES};
use crate::{StoryboardValidator, ValidationOutcome, ValidationResult};
use eisenstein_core::{PromptSource, StoryboardDocument};
use serde_json::{Map, Value, json};

/// Wrapper keys whose value is treated as the real payload.
pub const PAYLOAD_KEYS: &[&str] = &["storyboard", "data", "result", "response", "output"];

const MAX_PASSES: usize = 6;

/// One named structural repair. Returns `None` when it does not apply.
#[derive(Debug, Clone, Copy)]
pub struct Repair {
    name: &'static str,
    apply: fn(&Value) -> Option<Value>,
}

impl Repair {
    /// Name reported in [`Reconstruction::applied_repairs`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the repair.
    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.apply)(value)
    }
}

/// Document-level repairs in the order they are tried each pass.
pub const REPAIRS: &[Repair] = &[
    Repair {
        name: "decode_json_string",
        apply: decode_json_string,
    },
    Repair {
        name: "unwrap_nested_payload",
        apply: unwrap_nested_payload,
    },
    Repair {
        name: "wrap_top_level_array",
        apply: wrap_top_level_array,
    },
    Repair {
        name: "rename_prompt_array_alias",
        apply: rename_prompt_array_alias,
    },
    Repair {
        name: "coerce_single_prompt",
        apply: coerce_single_prompt,
    },
    Repair {
        name: "promote_string_prompts",
        apply: promote_string_prompts,
    },
    Repair {
        name: "rename_text_aliases",
        apply: rename_text_aliases,
    },
];

/// Outcome of [`StoryboardValidator::attempt_reconstruction`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconstruction {
    fixed_data: Option<StoryboardDocument>,
    applied_repairs: Vec<String>,
}

impl Reconstruction {
    /// The repaired storyboard, if the repairs produced a valid one.
    pub fn fixed_data(&self) -> Option<&StoryboardDocument> {
        self.fixed_data.as_ref()
    }

    /// Names of the repairs that changed the value, in order.
    pub fn applied_repairs(&self) -> &[String] {
        &self.applied_repairs
    }

    /// Take the repaired storyboard.
    pub fn into_fixed_data(self) -> Option<StoryboardDocument> {
        self.fixed_data
    }
}

impl StoryboardValidator {
    /// Try the [`REPAIRS`] on a value that failed validation.
    ///
    /// Individually invalid prompts are dropped when at least one valid prompt
    /// remains. Returns no document when nothing applied or the repaired value
    /// is still invalid.
    #[tracing::instrument(skip_all, fields(errors = validation.field_errors().len()))]
    pub fn attempt_reconstruction(
        &self,
        value: &Value,
        validation: &ValidationResult,
    ) -> Reconstruction {
        if validation.is_valid() {
            return Reconstruction {
                fixed_data: self.to_document(value),
                applied_repairs: Vec::new(),
            };
        }

        let (mut repaired, mut applied) = apply_repairs(value);
        if let Some(pruned) = self.drop_invalid_prompts(&repaired) {
            repaired = pruned;
            applied.push("drop_invalid_prompts".to_string());
        }

        if applied.is_empty() {
            tracing::debug!("No repair applies");
            return Reconstruction::default();
        }

        let fixed_data = match self.validate_document(&repaired) {
            ValidationOutcome::Valid(doc) => Some(doc.with_source(PromptSource::Reconstructed)),
            ValidationOutcome::Invalid(result) => {
                tracing::debug!(errors = ?result.errors(), "Repaired value is still invalid");
                None
            }
        };
        tracing::debug!(repairs = ?applied, fixed = fixed_data.is_some(), "Reconstruction finished");

        Reconstruction {
            fixed_data,
            applied_repairs: applied,
        }
    }

    fn drop_invalid_prompts(&self, value: &Value) -> Option<Value> {
        let prompts = value.get("prompts")?.as_array()?;
        let valid: Vec<Value> = prompts
            .iter()
            .enumerate()
            .filter(|(index, element)| self.prompt_errors(*index, element).0.is_empty())
            .map(|(_, element)| element.clone())
            .collect();

        if valid.is_empty() || valid.len() == prompts.len() {
            return None;
        }
        let mut object = value.as_object()?.clone();
        object.insert("prompts".to_string(), Value::Array(valid));
        Some(Value::Object(object))
    }
}

fn apply_repairs(value: &Value) -> (Value, Vec<String>) {
    let mut current = value.clone();
    let mut applied: Vec<String> = Vec::new();

    for _ in 0..MAX_PASSES {
        let mut changed = false;
        for repair in REPAIRS {
            if let Some(next) = repair.apply(&current) {
                if next == current {
                    continue;
                }
                current = next;
                changed = true;
                if !applied.iter().any(|name| name == repair.name()) {
                    applied.push(repair.name().to_string());
                }
            }
        }
        if !changed {
            break;
        }
    }
    (current, applied)
}

fn parse_structured(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(|v| v.is_object() || v.is_array())
}

fn has_prompts(object: &Map<String, Value>) -> bool {
    object.get("prompts").is_some_and(|v| !v.is_null())
}

/// A string holding JSON becomes that JSON; so does a string `prompts` field.
pub fn decode_json_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(text) => parse_structured(text),
        Value::Object(object) => {
            let decoded = parse_structured(object.get("prompts")?.as_str()?)?;
            let mut object = object.clone();
            object.insert("prompts".to_string(), decoded);
            Some(Value::Object(object))
        }
        _ => None,
    }
}

/// `{"storyboard": {...}}` and similar wrappers become their contents.
pub fn unwrap_nested_payload(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    if has_prompts(object) {
        return None;
    }
    PAYLOAD_KEYS.iter().find_map(|key| match object.get(*key)? {
        inner @ (Value::Object(_) | Value::Array(_)) => Some(inner.clone()),
        Value::String(text) => parse_structured(text),
        _ => None,
    })
}

/// A bare array of prompts becomes `{"prompts": [...]}`.
pub fn wrap_top_level_array(value: &Value) -> Option<Value> {
    value.as_array().map(|items| json!({ "prompts": items }))
}

/// `sections`, `scenes`, `shots` or `frames` arrays are renamed to `prompts`.
pub fn rename_prompt_array_alias(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    if has_prompts(object) {
        return None;
    }
    let alias = PROMPT_ARRAY_ALIASES
        .iter()
        .find(|alias| object.get(**alias).is_some_and(Value::is_array))?;

    let mut object = object.clone();
    let items = object.remove(*alias)?;
    object.insert("prompts".to_string(), items);
    Some(Value::Object(object))
}

/// A single prompt object, at the top level or as `prompts`, becomes a one-element list.
pub fn coerce_single_prompt(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    match object.get("prompts") {
        Some(single @ Value::Object(_)) => {
            let mut object = object.clone();
            object.insert("prompts".to_string(), Value::Array(vec![single.clone()]));
            Some(Value::Object(object))
        }
        None | Some(Value::Null) => {
            let looks_like_prompt = std::iter::once("text")
                .chain(TEXT_ALIASES.iter().copied())
                .any(|key| object.get(key).is_some_and(Value::is_string));
            looks_like_prompt.then(|| json!({ "prompts": [value] }))
        }
        Some(_) => None,
    }
}

/// String elements of `prompts` become `{"text": ...}`.
pub fn promote_string_prompts(value: &Value) -> Option<Value> {
    map_prompt_elements(value, |element| {
        element.as_str().map(|text| json!({ "text": text }))
    })
}

/// `description`, `prompt`, `visual` or `content` become `text` when `text` is absent.
pub fn rename_text_aliases(value: &Value) -> Option<Value> {
    map_prompt_elements(value, |element| {
        let object = element.as_object()?;
        if object.get("text").is_some_and(Value::is_string) {
            return None;
        }
        let alias = TEXT_ALIASES
            .iter()
            .find(|alias| object.get(**alias).is_some_and(Value::is_string))?;
        let mut object = object.clone();
        let text = object.remove(*alias)?;
        object.insert("text".to_string(), text);
        Some(Value::Object(object))
    })
}

// Rewrites elements for which `f` returns a replacement; None if nothing changed.
fn map_prompt_elements(value: &Value, f: impl Fn(&Value) -> Option<Value>) -> Option<Value> {
    let object = value.as_object()?;
    let items = object.get("prompts")?.as_array()?;

    let mut changed = false;
    let rewritten: Vec<Value> = items
        .iter()
        .map(|element| match f(element) {
            Some(replacement) => {
                changed = true;
                replacement
            }
            None => element.clone(),
        })
        .collect();

    if !changed {
        return None;
    }
    let mut object = object.clone();
    object.insert("prompts".to_string(), Value::Array(rewritten));
    Some(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(value: Value) -> Reconstruction {
        let validator = StoryboardValidator::default();
        let validation = validator.validate_storyboard(&value);
        assert!(!validation.is_valid());
        validator.attempt_reconstruction(&value, &validation)
    }

    #[test]
    fn test_unwraps_nested_storyboard() {
        let result = reconstruct(json!({"storyboard": {"prompts": [
            {"text": "A desert highway at dusk, long shadows", "timestamp": "00:05"}
        ]}}));
        let doc = result.fixed_data().unwrap();
        assert_eq!(doc.prompts()[0].timestamp.to_string(), "00:05");
        assert_eq!(doc.prompts()[0].source, Some(PromptSource::Reconstructed));
        assert_eq!(result.applied_repairs(), ["unwrap_nested_payload"]);
    }

    #[test]
    fn test_coerces_single_object() {
        let result = reconstruct(json!({"description": "A child flies a red kite on a windy cliff"}));
        let doc = result.fixed_data().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.prompts()[0].text, "A child flies a red kite on a windy cliff");
        assert!(result.applied_repairs().contains(&"coerce_single_prompt".to_string()));
        assert!(result.applied_repairs().contains(&"rename_text_aliases".to_string()));
    }

    #[test]
    fn test_alias_array_and_strings() {
        let result = reconstruct(json!({"scenes": [
            "Snow falls on an empty playground at night",
            "Headlights sweep across a frosted window"
        ]}));
        let doc = result.fixed_data().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.prompts()[1].timestamp.to_string(), "00:05");
    }

    #[test]
    fn test_drops_invalid_but_keeps_valid() {
        let result = reconstruct(json!({"prompts": [
            {"text": "Wide"},
            {"text": "A train crosses a viaduct above the valley"}
        ]}));
        assert_eq!(result.fixed_data().unwrap().len(), 1);
        assert_eq!(result.applied_repairs(), ["drop_invalid_prompts"]);
    }

    #[test]
    fn test_never_fabricates_text() {
        let result = reconstruct(json!({"prompts": [{"mood": "tense"}]}));
        assert!(result.fixed_data().is_none());

        let result = reconstruct(json!({"title": "Untitled"}));
        assert!(result.fixed_data().is_none());
        assert!(result.applied_repairs().is_empty());
    }

    #[test]
    fn test_decodes_string_payload() {
        let encoded = r#"{"prompts": [{"text": "Steam rises from a noodle stall at night"}]}"#;
        let result = reconstruct(json!({"result": encoded}));
        assert_eq!(result.fixed_data().unwrap().len(), 1);
    }
}

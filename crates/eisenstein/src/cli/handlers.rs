//! Command handlers. Each returns the JSON document the binary prints.

use eisenstein::{
    Director, EisensteinConfig, EisensteinResult, ExtractionMetrics, ExtractionOutcome,
    FormatCorrector, IoError, JsonError, JsonExtractor, NotificationRegistry, PipelineOutcome,
    Script, StoryboardPipeline, StoryboardValidator, ValidationOutcome,
};
use serde_json::{Value, json};
use std::io::Read;
use std::path::Path;

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> EisensteinResult<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| IoError::new(format!("Failed to read stdin: {}", e)))?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| IoError::new(format!("Failed to read {}: {}", path.display(), e)).into())
}

/// The explicit configuration file, or the layered defaults.
pub fn load_config(path: Option<&Path>) -> EisensteinResult<EisensteinConfig> {
    match path {
        Some(path) => EisensteinConfig::from_file(path),
        None => EisensteinConfig::load(),
    }
}

fn to_json(value: &impl serde::Serialize) -> EisensteinResult<Value> {
    Ok(serde_json::to_value(value).map_err(JsonError::from)?)
}

/// `eisenstein correct`
pub fn correct(raw: &str, config: &EisensteinConfig) -> EisensteinResult<Value> {
    let result = FormatCorrector::new(config.corrector.clone()).correct(raw);
    to_json(&result)
}

/// `eisenstein extract`
#[tracing::instrument(skip(raw, config), fields(len = raw.len()))]
pub fn extract(raw: &str, config: &EisensteinConfig, with_metrics: bool) -> EisensteinResult<Value> {
    let pipeline =
        StoryboardPipeline::from_config(config, ExtractionMetrics::new(), NotificationRegistry::new())?;
    pipeline
        .fallback()
        .register_notification_callback(|notification| {
            tracing::warn!(
                reason = %notification.reason(),
                prompts = *notification.extracted_prompt_count(),
                "{}",
                notification.message()
            );
        });

    let mut output = match pipeline.process(raw) {
        PipelineOutcome::Structured(structured) => json!({
            "outcome": "structured",
            "storyboard": to_json(&structured.document.to_wire())?,
            "method": structured.method.to_string(),
            "confidence": structured.confidence,
            "appliedRepairs": structured.applied_repairs,
        }),
        PipelineOutcome::Fallback(basic) => json!({
            "outcome": "fallback",
            "storyboard": to_json(&basic.document().to_wire())?,
            "metadata": to_json(&basic.metadata)?,
            "parseError": diagnose(raw, config)?,
        }),
        PipelineOutcome::Empty { reason } => json!({
            "outcome": "empty",
            "reason": reason.to_string(),
            "parseError": diagnose(raw, config)?,
        }),
    };

    if with_metrics {
        output["metrics"] = to_json(&pipeline.fallback().get_metrics())?;
        output["summary"] = to_json(&pipeline.fallback().get_metrics_summary())?;
    }
    Ok(output)
}

// Structured diagnosis when no strategy found JSON; null otherwise.
fn diagnose(raw: &str, config: &EisensteinConfig) -> EisensteinResult<Value> {
    let mut extractor = JsonExtractor::new(FormatCorrector::new(config.corrector.clone()));
    match extractor.extract(raw) {
        ExtractionOutcome::Failed(error) => to_json(&error),
        ExtractionOutcome::Extracted(_) => Ok(Value::Null),
    }
}

/// `eisenstein validate`
pub fn validate(raw: &str, config: &EisensteinConfig) -> EisensteinResult<Value> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(JsonError::from)?;
    let validator = StoryboardValidator::new(config.validator.clone());

    match validator.validate_document(&value) {
        ValidationOutcome::Valid(document) => Ok(json!({
            "valid": true,
            "storyboard": to_json(&document.to_wire())?,
            "warnings": validator.validate_storyboard(&value).warnings(),
        })),
        ValidationOutcome::Invalid(result) => {
            let reconstruction = validator.attempt_reconstruction(&value, &result);
            let repaired = match reconstruction.fixed_data() {
                Some(document) => to_json(&document.to_wire())?,
                None => Value::Null,
            };
            Ok(json!({
                "valid": false,
                "validation": to_json(&result)?,
                "appliedRepairs": reconstruction.applied_repairs(),
                "repaired": repaired,
            }))
        }
    }
}

/// `eisenstein sanitize`
pub fn sanitize(raw: &str, config: &EisensteinConfig) -> EisensteinResult<Value> {
    let pipeline =
        StoryboardPipeline::from_config(config, ExtractionMetrics::new(), NotificationRegistry::new())?;
    let sanitizer = pipeline.sanitizer();

    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => Ok(sanitizer.sanitize_json(&value)),
        Err(_) => {
            let sanitized = sanitizer.sanitize_text(raw);
            Ok(json!({
                "text": sanitized.text(),
                "appliedRules": sanitized.applied_rules(),
                "truncated": sanitized.truncated(),
            }))
        }
    }
}

/// `eisenstein direct`
pub async fn direct(
    script_path: &Path,
    task: &str,
    config: &EisensteinConfig,
) -> EisensteinResult<Value> {
    let script = Script::from_file(script_path)?;
    let (driver, tools) = script.into_parts();
    tracing::info!(tools = ?tools.names(), script = %script_path.display(), "Loaded script");

    let pipeline =
        StoryboardPipeline::from_config(config, ExtractionMetrics::new(), NotificationRegistry::new())?;
    let director = Director::new(driver, tools, pipeline, config.director.clone())?;
    let report = director.run(task).await?;

    let mut output = to_json(&report)?;
    output["metrics"] = to_json(&director.pipeline().fallback().get_metrics_summary())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eisenstein::EisensteinErrorKind;

    fn config() -> EisensteinConfig {
        EisensteinConfig::bundled().unwrap()
    }

    #[test]
    fn test_correct_reports_changes() {
        let output = correct("```json\n{'text': 'A quiet harbour',}\n```", &config()).unwrap();
        let corrected: Value = serde_json::from_str(output["corrected"].as_str().unwrap()).unwrap();
        assert_eq!(corrected, json!({"text": "A quiet harbour"}));
    }

    #[test]
    fn test_extract_structured() {
        let raw = "```json\n{\"prompts\": [{\"text\": \"A rainy neon street at night\", \"timestamp\": \"00:15\"}]}\n```";
        let output = extract(raw, &config(), true).unwrap();
        assert_eq!(output["outcome"], "structured");
        assert_eq!(output["storyboard"]["prompts"][0]["timestamp"], "00:15");
        assert_eq!(output["metrics"]["successfulRequests"], 1);
    }

    #[test]
    fn test_extract_fallback_carries_diagnosis() {
        let raw = "Scene 1: a sunset over the ocean with dramatic orange clouds";
        let output = extract(raw, &config(), true).unwrap();
        assert_eq!(output["outcome"], "fallback");
        assert_eq!(output["parseError"]["type"], "no_json_found");
        assert_eq!(output["metrics"]["totalFallbackUsages"], 1);
    }

    #[test]
    fn test_validate_invalid_repairs() {
        let output = validate(
            r#"{"scenes": ["Snow falls on an empty playground at night"]}"#,
            &config(),
        )
        .unwrap();
        assert_eq!(output["valid"], false);
        assert_eq!(output["repaired"]["prompts"].as_array().unwrap().len(), 1);
        let err = validate("not json", &config()).unwrap_err();
        assert!(matches!(err.kind(), EisensteinErrorKind::Json(_)));
    }

    #[test]
    fn test_sanitize_text_and_json() {
        let output = sanitize("hello <script>alert(1)</script> world", &config()).unwrap();
        assert!(!output["text"].as_str().unwrap().contains("<script>"));

        let output = sanitize(r#"{"text": "click javascript:alert(1)"}"#, &config()).unwrap();
        assert!(!output["text"].as_str().unwrap().contains("javascript:"));
    }
}

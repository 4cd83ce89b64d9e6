//! Raw model text to a trusted storyboard, in one call.

use crate::EisensteinConfig;
use eisenstein_core::{
    BasicStoryboard, ExtractionMethod, FallbackReason, PromptSource, StoryboardDocument,
};
use eisenstein_error::{ConfigError, EisensteinResult};
use eisenstein_extract::{
    ExtractedDocument, ExtractionOutcome, FormatCorrector, JsonExtractor, StoryboardValidator,
    ValidationOutcome,
};
use eisenstein_fallback::{ExtractionMetrics, FallbackProcessor, NotificationRegistry};
use eisenstein_security::ContentSanitizer;
use serde_json::Value;
use std::time::Instant;

/// A storyboard recovered from structured model output.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredStoryboard {
    /// Sanitized document
    pub document: StoryboardDocument,
    /// Strategy that found the JSON
    pub method: ExtractionMethod,
    /// Extraction confidence
    pub confidence: f64,
    /// Reconstruction repairs applied, if validation failed at first
    pub applied_repairs: Vec<String>,
}

/// What [`StoryboardPipeline::process`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Extracted, validated (possibly after repair) and sanitized
    Structured(StructuredStoryboard),
    /// Mined from plain text, then sanitized
    Fallback(BasicStoryboard),
    /// Nothing usable; `reason` is why structured extraction was abandoned
    Empty {
        /// Last reason recorded on the way down
        reason: FallbackReason,
    },
}

impl PipelineOutcome {
    /// The storyboard, whichever path produced it.
    pub fn document(&self) -> Option<&StoryboardDocument> {
        match self {
            Self::Structured(structured) => Some(&structured.document),
            Self::Fallback(basic) => Some(basic.document()),
            Self::Empty { .. } => None,
        }
    }

    /// Take the storyboard, whichever path produced it.
    pub fn into_document(self) -> Option<StoryboardDocument> {
        match self {
            Self::Structured(structured) => Some(structured.document),
            Self::Fallback(basic) => Some(basic.into_document()),
            Self::Empty { .. } => None,
        }
    }

    /// True when no storyboard was produced.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// True for a fallback storyboard.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Format correction, extraction, validation, reconstruction, sanitization
/// and fallback, wired together.
///
/// # Examples
///
/// ```
/// use eisenstein_director::{PipelineOutcome, StoryboardPipeline};
///
/// let pipeline = StoryboardPipeline::default();
/// let raw = "Here's the result:\n\n```json\n{\"prompts\":[{\"text\":\"A rainy neon street at night, wide shot, cold blue light\",\"mood\":\"noir\",\"timestamp\":\"00:15\"}]}\n```\n\nEnjoy!";
///
/// let PipelineOutcome::Structured(structured) = pipeline.process(raw) else {
///     panic!("expected a structured storyboard");
/// };
/// assert_eq!(structured.document.prompts()[0].timestamp.to_string(), "00:15");
/// ```
#[derive(Debug, Default)]
pub struct StoryboardPipeline {
    corrector: FormatCorrector,
    validator: StoryboardValidator,
    sanitizer: ContentSanitizer,
    fallback: FallbackProcessor,
}

impl StoryboardPipeline {
    /// Assemble a pipeline from its stages.
    pub fn new(
        corrector: FormatCorrector,
        validator: StoryboardValidator,
        sanitizer: ContentSanitizer,
        fallback: FallbackProcessor,
    ) -> Self {
        Self {
            corrector,
            validator,
            sanitizer,
            fallback,
        }
    }

    /// Build every stage from configuration, sharing the given metrics and callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured prohibited pattern does not compile.
    pub fn from_config(
        config: &EisensteinConfig,
        metrics: ExtractionMetrics,
        notifications: NotificationRegistry,
    ) -> EisensteinResult<Self> {
        let sanitizer = ContentSanitizer::new(config.sanitizer.clone())
            .map_err(|e| ConfigError::new(format!("Invalid sanitizer configuration: {}", e)))?;
        Ok(Self::new(
            FormatCorrector::new(config.corrector.clone()),
            StoryboardValidator::new(config.validator.clone()),
            sanitizer,
            FallbackProcessor::new(config.fallback.clone(), metrics, notifications),
        ))
    }

    /// The fallback stage, for callback registration and metrics.
    pub fn fallback(&self) -> &FallbackProcessor {
        &self.fallback
    }

    /// The sanitizer stage.
    pub fn sanitizer(&self) -> &ContentSanitizer {
        &self.sanitizer
    }

    /// Shared extraction metrics.
    pub fn metrics(&self) -> &ExtractionMetrics {
        self.fallback.metrics()
    }

    /// Turn raw model output into a storyboard and record the request.
    ///
    /// Never fails: malformed input ends in [`PipelineOutcome::Empty`].
    #[tracing::instrument(skip(self, raw), fields(len = raw.len()))]
    pub fn process(&self, raw: &str) -> PipelineOutcome {
        let started = Instant::now();
        let mut extractor = JsonExtractor::new(self.corrector.clone());

        let outcome = match extractor.extract(raw) {
            ExtractionOutcome::Extracted(extracted) => self.from_extracted(extracted, raw),
            ExtractionOutcome::Failed(error) => {
                tracing::debug!(kind = %error.kind(), "Structured extraction failed");
                self.from_fallback(raw, FallbackReason::ExtractionFailed)
            }
        };

        let method = match &outcome {
            PipelineOutcome::Structured(structured) => Some(structured.method),
            _ => None,
        };
        self.fallback.metrics().record_request(
            method.is_some(),
            method,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        tracing::debug!(
            structured = method.is_some(),
            fallback = outcome.is_fallback(),
            "Pipeline finished"
        );
        outcome
    }

    fn from_extracted(&self, extracted: ExtractedDocument, raw: &str) -> PipelineOutcome {
        let method = *extracted.method();
        let confidence = *extracted.confidence();
        let data = extracted.into_data();

        let (document, applied_repairs) = match self.validator.validate_document(&data) {
            ValidationOutcome::Valid(document) => {
                (tag_untagged(document, PromptSource::Model), Vec::new())
            }
            ValidationOutcome::Invalid(result) => {
                let reconstruction = self.validator.attempt_reconstruction(&data, &result);
                let repairs = reconstruction.applied_repairs().to_vec();
                match reconstruction.into_fixed_data() {
                    Some(document) => (document, repairs),
                    None => {
                        tracing::debug!(errors = ?result.errors(), "Validation and reconstruction failed");
                        let leaves = string_leaves(&data);
                        let text = if leaves.trim().is_empty() { raw } else { leaves.as_str() };
                        return self.from_fallback(text, FallbackReason::ValidationFailed);
                    }
                }
            }
        };

        match self.sanitizer.sanitize_storyboard(&document) {
            Some(document) => PipelineOutcome::Structured(StructuredStoryboard {
                document,
                method,
                confidence,
                applied_repairs,
            }),
            None => {
                tracing::warn!("Sanitization removed every prompt");
                self.from_fallback(raw, FallbackReason::SanitizationEmptied)
            }
        }
    }

    fn from_fallback(&self, text: &str, reason: FallbackReason) -> PipelineOutcome {
        let Some(basic) = self.fallback.process_with_fallback(text, &reason) else {
            return PipelineOutcome::Empty { reason };
        };
        match self.sanitizer.sanitize_storyboard(basic.document()) {
            Some(document) => {
                PipelineOutcome::Fallback(BasicStoryboard::new(document, basic.metadata))
            }
            None => PipelineOutcome::Empty {
                reason: FallbackReason::SanitizationEmptied,
            },
        }
    }
}

// Tags prompts that carry no source of their own.
fn tag_untagged(document: StoryboardDocument, source: PromptSource) -> StoryboardDocument {
    let prompts = document
        .prompts()
        .iter()
        .cloned()
        .map(|mut prompt| {
            prompt.source.get_or_insert(source);
            prompt
        })
        .collect();
    StoryboardDocument::new(prompts).unwrap_or(document)
}

/// Every string value in a JSON tree, one paragraph each.
pub fn string_leaves(value: &Value) -> String {
    fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
        match value {
            Value::String(text) if !text.trim().is_empty() => out.push(text),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(object) => object.values().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let mut leaves = Vec::new();
    collect(value, &mut leaves);
    leaves.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_leaves() {
        let value = json!({"scenes": [{"caption": "Dust storm over the plain"}, 3, {"mood": " "}], "title": "Drift"});
        assert_eq!(string_leaves(&value), "Dust storm over the plain\n\nDrift");
    }

    #[test]
    fn test_untagged_prompts_become_model() {
        let pipeline = StoryboardPipeline::default();
        let raw = r#"{"prompts": [
            {"text": "A tram crosses a snowy square", "source": "manual"},
            {"text": "Steam rises from a street vent"}
        ]}"#;
        let document = pipeline.process(raw).into_document().unwrap();
        assert_eq!(document.prompts()[0].source, Some(PromptSource::Manual));
        assert_eq!(document.prompts()[1].source, Some(PromptSource::Model));
    }

    #[test]
    fn test_request_metrics_recorded() {
        let pipeline = StoryboardPipeline::default();
        pipeline.process(r#"{"prompts": [{"text": "A kite above the dunes at noon"}]}"#);
        pipeline.process("nothing to see");

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.successful_requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.extraction_method_breakdown.values().sum::<u64>(), 1);
    }
}

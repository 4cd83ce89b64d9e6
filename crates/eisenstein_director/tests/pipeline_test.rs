//! Storyboard pipeline end to end.

use eisenstein_core::{ExtractionMethod, PromptSource};
use eisenstein_director::{PipelineOutcome, StoryboardPipeline};
use eisenstein_security::ContentSanitizer;

const SCENE: &str = "A rainy neon street at night, wide shot, cold blue light";

#[test]
fn test_fenced_storyboard_passes_through_unchanged() {
    let raw = format!(
        "Here's the result:\n\n```json\n{{\"prompts\":[{{\"text\":\"{}\",\"mood\":\"noir\",\"timestamp\":\"00:15\"}}]}}\n```\n\nEnjoy!",
        SCENE
    );
    let pipeline = StoryboardPipeline::default();

    let PipelineOutcome::Structured(structured) = pipeline.process(&raw) else {
        panic!("expected a structured storyboard");
    };

    assert_eq!(structured.method, ExtractionMethod::FenceBlock);
    assert!(structured.applied_repairs.is_empty());
    assert_eq!(structured.document.len(), 1);

    let prompt = &structured.document.prompts()[0];
    assert_eq!(prompt.text, SCENE);
    assert_eq!(prompt.mood, "noir");
    assert_eq!(prompt.timestamp.to_string(), "00:15");
    assert_eq!(prompt.source, Some(PromptSource::Model));

    let sanitized = ContentSanitizer::default().sanitize_text(SCENE);
    assert!(!sanitized.was_modified());
    assert_eq!(pipeline.metrics().total_fallback_usages(), 0);
}

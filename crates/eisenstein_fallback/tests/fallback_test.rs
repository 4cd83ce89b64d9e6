use eisenstein_core::{FallbackNotification, FallbackReason, NotificationKind, PromptSource};
use eisenstein_fallback::{
    ExtractionMetrics, FallbackConfig, FallbackProcessor, NotificationRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn recorder(processor: &FallbackProcessor) -> Arc<parking_lot::Mutex<Vec<FallbackNotification>>> {
    let seen: Arc<parking_lot::Mutex<Vec<FallbackNotification>>> = Arc::default();
    let sink = seen.clone();
    processor.register_notification_callback(move |n| sink.lock().push(n.clone()));
    seen
}

#[test]
fn test_fallback_totality() {
    let processor = FallbackProcessor::default();
    let inputs = [
        "",
        "   \n\t",
        "{\"prompts\": [",
        "}}}]]]",
        "No storyboard today.",
        "Scene 1:\nScene 2:",
        "```json\n{\"text\": \"A burning ship drifts toward the harbour at night\"\n```",
        "1. A red door\n2. A blue window\n3. Fog over the bridge",
        "🌅🌊 Sunset, ocean, clouds — ünïcödé everywhere.",
    ];

    for input in inputs {
        if let Some(storyboard) =
            processor.process_with_fallback(input, &FallbackReason::ExtractionFailed)
        {
            assert!(!storyboard.prompts().is_empty(), "empty storyboard for {input:?}");
            assert!(
                storyboard
                    .prompts()
                    .iter()
                    .all(|p| p.source == Some(PromptSource::Fallback) && !p.text.trim().is_empty()),
                "bad prompt for {input:?}"
            );
            assert_eq!(storyboard.metadata.source, PromptSource::Fallback);
            assert!((0.0..=1.0).contains(&storyboard.metadata.confidence));
        }
    }
}

#[test]
fn test_sunset_scenario() {
    let processor = FallbackProcessor::default();
    let raw = "This just describes a sunset over the ocean with dramatic orange clouds.";
    let storyboard = processor
        .process_with_fallback(raw, &FallbackReason::ExtractionFailed)
        .expect("fallback storyboard");

    let text = storyboard.prompts()[0].text.to_lowercase();
    assert!(text.contains("sunset"));
    assert!(text.contains("ocean"));
    assert_eq!(storyboard.metadata.extraction_method, "text_based");
    assert!(!storyboard.metadata.low_confidence);
    assert!(storyboard.metadata.confidence > 0.0);
    assert_eq!(storyboard.prompts()[0].timestamp.to_string(), "00:00");
}

#[test]
fn test_notification_emitted_exactly_once() {
    let processor = FallbackProcessor::default();
    let seen = recorder(&processor);

    processor
        .process_with_fallback("Scene 1: A lone tree on a windswept hill at dusk", &FallbackReason::ValidationFailed)
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(*seen[0].kind(), NotificationKind::FallbackUsed);
    assert_eq!(*seen[0].extracted_prompt_count(), 1);
    assert_eq!(seen[0].reason(), "validation_failed");
    assert!(!seen[0].reduced_functionality().is_empty());

    let wire = serde_json::to_value(&seen[0]).unwrap();
    assert_eq!(wire["type"], "fallback_used");
    assert!(wire["reducedFunctionality"].as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_no_notification_without_storyboard() {
    let processor = FallbackProcessor::default();
    let seen = recorder(&processor);
    assert!(
        processor
            .process_with_fallback("Error 500", &FallbackReason::ExtractionFailed)
            .is_none()
    );
    assert!(seen.lock().is_empty());
    assert_eq!(processor.get_metrics().total_fallback_usages, 0);
}

#[test]
fn test_unregistered_callback_not_called() {
    let processor = FallbackProcessor::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let id = processor.register_notification_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(processor.unregister_notification_callback(id));

    processor.process_with_fallback("A neon sign flickers in the rain", &FallbackReason::ExtractionFailed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_callback_does_not_abort_fallback() {
    let processor = FallbackProcessor::default();
    processor.register_notification_callback(|_| panic!("subscriber failure"));
    let seen = recorder(&processor);

    let storyboard = processor
        .process_with_fallback("A neon sign flickers in the rain", &FallbackReason::ExtractionFailed);
    assert!(storyboard.is_some());
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(processor.get_metrics().total_fallback_usages, 1);
}

#[test]
fn test_metrics_monotonic_after_reset() {
    let metrics = ExtractionMetrics::new();
    let processor = FallbackProcessor::new(
        FallbackConfig::default(),
        metrics.clone(),
        NotificationRegistry::new(),
    );
    processor.process_with_fallback("Warm light spills from a cafe window", &FallbackReason::ExtractionFailed);
    processor.reset_metrics();

    let reason = FallbackReason::from("sanitization_emptied");
    for n in 1..=7u64 {
        processor.process_with_fallback("Warm light spills from a cafe window", &reason);
        let snapshot = processor.get_metrics();
        assert_eq!(snapshot.fallback_reasons.get("sanitization_emptied"), Some(&n));
        assert_eq!(snapshot.total_fallback_usages, n);
    }
    assert_eq!(metrics.fallback_count(&FallbackReason::ExtractionFailed), 0);
    assert!(processor.get_metrics().last_fallback_timestamp.is_some());

    let summary = processor.get_metrics_summary();
    assert_eq!(summary.total_fallback_usages, 7);
    assert_eq!(summary.top_reasons[0].reason, "sanitization_emptied");
    assert_eq!(summary.top_reasons[0].count, 7);
}

#[test]
fn test_fresh_state_per_processor() {
    let first = FallbackProcessor::default();
    let second = FallbackProcessor::default();
    first.process_with_fallback("A neon sign flickers in the rain", &FallbackReason::ExtractionFailed);
    assert_eq!(second.get_metrics().total_fallback_usages, 0);
}

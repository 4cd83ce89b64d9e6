//! Last-resort storyboard generation from plain text.

use crate::mining::{self, Fragment};
use crate::{
    CallbackId, ExtractionMetrics, FallbackConfig, MetricsSnapshot, MetricsSummary,
    NotificationRegistry,
};
use eisenstein_core::{
    BasicStoryboard, DEFAULT_MOOD, FallbackMetadata, FallbackNotification, FallbackReason,
    PromptSource, StoryboardDocument, StoryboardPrompt, Timestamp,
};

/// Reported in [`FallbackMetadata::extraction_method`].
pub const TEXT_BASED: &str = "text_based";

/// Mines plain text for scene descriptions when structured extraction fails.
///
/// Owns handles to the shared metrics and notification registry; clones of
/// those handles observe the same state.
///
/// # Examples
///
/// ```
/// use eisenstein_core::FallbackReason;
/// use eisenstein_fallback::FallbackProcessor;
///
/// let processor = FallbackProcessor::default();
/// let storyboard = processor
///     .process_with_fallback(
///         "This just describes a sunset over the ocean with dramatic orange clouds.",
///         &FallbackReason::ExtractionFailed,
///     )
///     .unwrap();
///
/// assert_eq!(storyboard.prompts().len(), 1);
/// assert_eq!(storyboard.prompts()[0].mood, "dramatic");
/// assert_eq!(processor.get_metrics().total_fallback_usages, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FallbackProcessor {
    config: FallbackConfig,
    metrics: ExtractionMetrics,
    notifications: NotificationRegistry,
}

impl FallbackProcessor {
    /// Creates a processor over injected metrics and notification state.
    pub fn new(
        config: FallbackConfig,
        metrics: ExtractionMetrics,
        notifications: NotificationRegistry,
    ) -> Self {
        Self {
            config,
            metrics,
            notifications,
        }
    }

    /// The mining configuration.
    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Handle to the shared metrics.
    pub fn metrics(&self) -> &ExtractionMetrics {
        &self.metrics
    }

    /// Handle to the callback registry.
    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    /// Mine `raw_text`, then record the fallback and notify callbacks once.
    ///
    /// Returns `None` (and records nothing) when the text holds no visual
    /// description at all.
    #[tracing::instrument(skip(self, raw_text, reason), fields(len = raw_text.len(), reason = %reason))]
    pub fn process_with_fallback(
        &self,
        raw_text: &str,
        reason: &FallbackReason,
    ) -> Option<BasicStoryboard> {
        let Some(storyboard) = self.generate_basic_storyboard(raw_text, reason) else {
            tracing::debug!("No visual description found; fallback produced nothing");
            return None;
        };

        self.metrics.record_fallback(reason);
        let notification = FallbackNotification::fallback_used(
            reason,
            storyboard.prompts().len(),
            self.config.reduced_functionality.clone(),
        );
        tracing::warn!(
            prompts = storyboard.prompts().len(),
            confidence = storyboard.metadata.confidence,
            low_confidence = storyboard.metadata.low_confidence,
            "Using fallback storyboard"
        );
        self.notifications.notify(&notification);

        Some(storyboard)
    }

    /// Mine `raw_text` into a storyboard without touching metrics or callbacks.
    pub fn generate_basic_storyboard(
        &self,
        raw_text: &str,
        reason: &FallbackReason,
    ) -> Option<BasicStoryboard> {
        let mined_pairs = mining::mine_text_pairs(raw_text);
        let (source_text, candidates) = if mined_pairs.is_empty() {
            (raw_text.to_string(), mining::split_fragments(raw_text))
        } else {
            tracing::debug!(count = mined_pairs.len(), "Mined text values from JSON-like output");
            (mined_pairs.join("\n"), mined_pairs)
        };

        let fragments = self.select_fragments(&candidates);
        if fragments.is_empty() {
            return None;
        }

        let use_embedded = fragments.iter().all(|f| {
            f.timestamp
                .as_deref()
                .and_then(Timestamp::parse_lenient)
                .is_some()
        });

        let mut prompts: Vec<StoryboardPrompt> = fragments
            .iter()
            .enumerate()
            .map(|(index, fragment)| {
                let timestamp = fragment
                    .timestamp
                    .as_deref()
                    .filter(|_| use_embedded)
                    .and_then(Timestamp::parse_lenient)
                    .unwrap_or_else(|| {
                        Timestamp::sequential(index, self.config.timestamp_spacing_secs)
                    });
                StoryboardPrompt {
                    text: fragment.text.clone(),
                    mood: self.mood_for(fragment),
                    timestamp,
                    source: Some(PromptSource::Fallback),
                    confidence: None,
                }
            })
            .collect();

        let output: Vec<&str> = prompts
            .iter()
            .flat_map(|p| [p.text.as_str(), p.mood.as_str()])
            .collect();
        let keyword_overlap = mining::keyword_overlap(&source_text, &output.join(" "));
        let confidence = (self.config.confidence_ceiling * keyword_overlap).clamp(0.0, 1.0);
        let low_confidence = keyword_overlap < self.config.min_keyword_overlap;
        if low_confidence {
            tracing::warn!(keyword_overlap, "Fallback storyboard preserves little of the source");
        }
        for prompt in &mut prompts {
            prompt.confidence = Some(confidence);
        }

        let document = StoryboardDocument::new(prompts)?;
        Some(BasicStoryboard::new(
            document,
            FallbackMetadata {
                source: PromptSource::Fallback,
                extraction_method: TEXT_BASED.to_string(),
                confidence,
                keyword_overlap,
                low_confidence,
                reason: reason.to_string(),
            },
        ))
    }

    // Keeps fragments with visual signal, preferring ones long enough to stand alone.
    fn select_fragments(&self, candidates: &[String]) -> Vec<Fragment> {
        let visual: Vec<Fragment> = candidates
            .iter()
            .filter(|raw| !mining::is_introduction(raw))
            .map(|raw| mining::clean_fragment(raw))
            .filter(|f| !f.text.is_empty())
            .filter(|f| mining::vocabulary_hits(&f.text, &self.config.visual_keywords) > 0)
            .collect();

        let long_enough: Vec<Fragment> = visual
            .iter()
            .filter(|f| f.text.chars().count() >= self.config.min_fragment_chars)
            .cloned()
            .collect();

        let mut selected = if long_enough.is_empty() {
            visual
        } else {
            long_enough
        };
        selected.truncate(self.config.max_prompts.max(1));
        selected
    }

    fn mood_for(&self, fragment: &Fragment) -> String {
        fragment
            .mood_label
            .clone()
            .or_else(|| mining::first_vocabulary_word(&fragment.text, &self.config.mood_words))
            .unwrap_or_else(|| DEFAULT_MOOD.to_string())
    }

    /// Adds a notification callback.
    pub fn register_notification_callback<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&FallbackNotification) + Send + Sync + 'static,
    {
        self.notifications.register(callback)
    }

    /// Removes a notification callback. Returns false when the handle was unknown.
    pub fn unregister_notification_callback(&self, id: CallbackId) -> bool {
        self.notifications.unregister(id)
    }

    /// Deep-copied metrics snapshot.
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Fallback usage summary.
    pub fn get_metrics_summary(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    /// Zeroes the shared metrics.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(text: &str) -> Option<BasicStoryboard> {
        FallbackProcessor::default().generate_basic_storyboard(text, &FallbackReason::ExtractionFailed)
    }

    #[test]
    fn test_no_visual_signal_yields_none() {
        assert!(generate("").is_none());
        assert!(generate("I cannot help with that request, sorry.").is_none());
    }

    #[test]
    fn test_scene_markers_become_prompts() {
        let text = "Here is your storyboard:\n\
                    Scene 1: A foggy pier at dawn, gulls circling overhead (mood: calm)\n\
                    Scene 2: A fishing boat cuts through grey waves toward the horizon";
        let storyboard = generate(text).unwrap();
        let prompts = storyboard.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].text, "A foggy pier at dawn, gulls circling overhead");
        assert_eq!(prompts[0].mood, "calm");
        assert_eq!(prompts[1].timestamp.to_string(), "00:05");
        assert!(prompts.iter().all(|p| p.source == Some(PromptSource::Fallback)));
        assert_eq!(storyboard.metadata.extraction_method, TEXT_BASED);
    }

    #[test]
    fn test_embedded_timestamps_used_when_complete() {
        let text = "- 0:10 Snow falls over a silent forest\n- 0:20 A fox crosses the frozen river";
        let storyboard = generate(text).unwrap();
        let stamps: Vec<String> = storyboard
            .prompts()
            .iter()
            .map(|p| p.timestamp.to_string())
            .collect();
        assert_eq!(stamps, ["00:10", "00:20"]);
    }

    #[test]
    fn test_truncated_json_text_is_mined() {
        let text = r#"{"prompts": [{"text": "A lighthouse beam sweeps the stormy sea", "mood": "ominous"}, {"text": "Waves crash over the rocks"#;
        let storyboard = generate(text).unwrap();
        assert_eq!(storyboard.prompts().len(), 2);
        assert_eq!(storyboard.prompts()[1].text, "Waves crash over the rocks");
        assert!(!storyboard.metadata.low_confidence);
    }

    #[test]
    fn test_short_fragments_kept_when_nothing_longer() {
        let storyboard = generate("Red sky.").unwrap();
        assert_eq!(storyboard.prompts()[0].text, "Red sky.");
    }

    #[test]
    fn test_low_overlap_is_flagged_not_dropped() {
        let text = "Quarterly revenue projections, marketing headcount, procurement timelines, \
                    vendor negotiations and compliance paperwork were discussed.\n\n\
                    A red door.";
        let storyboard = generate(text).unwrap();
        assert_eq!(storyboard.prompts().len(), 1);
        assert!(storyboard.metadata.low_confidence);
        assert!(storyboard.metadata.confidence < 0.3);
    }

    #[test]
    fn test_prompt_cap() {
        let text: String = (1..=20)
            .map(|i| format!("Scene {i}: A lantern glows in window number {i} of the tower\n"))
            .collect();
        let processor = FallbackProcessor::new(
            FallbackConfig::default().with_max_prompts(4),
            ExtractionMetrics::new(),
            NotificationRegistry::new(),
        );
        let storyboard = processor
            .generate_basic_storyboard(&text, &FallbackReason::ExtractionFailed)
            .unwrap();
        assert_eq!(storyboard.prompts().len(), 4);
    }

    #[test]
    fn test_generate_is_pure() {
        let processor = FallbackProcessor::default();
        processor
            .generate_basic_storyboard("A sunset over the sea", &FallbackReason::ExtractionFailed)
            .unwrap();
        assert_eq!(processor.get_metrics().total_fallback_usages, 0);
    }
}

//! Fallback mining configuration.

use serde::{Deserialize, Serialize};

/// Tuning for plain-text storyboard mining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct FallbackConfig {
    /// Shortest fragment kept as a prompt, in characters
    #[serde(default = "default_min_fragment_chars")]
    pub min_fragment_chars: usize,

    /// Most prompts a fallback storyboard may hold
    #[serde(default = "default_max_prompts")]
    pub max_prompts: usize,

    /// Seconds between synthesised timestamps
    #[serde(default = "default_timestamp_spacing_secs")]
    pub timestamp_spacing_secs: u32,

    /// Keyword overlap below which the result is flagged low-confidence
    #[serde(default = "default_min_keyword_overlap")]
    pub min_keyword_overlap: f64,

    /// Confidence of a fallback storyboard that preserves every key word
    #[serde(default = "default_confidence_ceiling")]
    pub confidence_ceiling: f64,

    /// Words that signal a visual description
    #[serde(default = "default_visual_keywords")]
    pub visual_keywords: Vec<String>,

    /// Words recognised as a scene's mood
    #[serde(default = "default_mood_words")]
    pub mood_words: Vec<String>,

    /// Capabilities reported missing in fallback notifications
    #[serde(default = "default_reduced_functionality")]
    pub reduced_functionality: Vec<String>,
}

fn default_min_fragment_chars() -> usize {
    20
}

fn default_max_prompts() -> usize {
    12
}

fn default_timestamp_spacing_secs() -> u32 {
    5
}

fn default_min_keyword_overlap() -> f64 {
    0.5
}

fn default_confidence_ceiling() -> f64 {
    0.6
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_visual_keywords() -> Vec<String> {
    words(&[
        // framing and camera
        "shot", "wide", "close", "closeup", "angle", "pan", "zoom", "frame", "camera", "view",
        "silhouette", "foreground", "background", "aerial", "overhead",
        // light and colour
        "light", "lit", "lighting", "glow", "glowing", "shadow", "sunlight", "moonlight", "neon",
        "dark", "bright", "color", "colour", "red", "orange", "yellow", "green", "blue", "purple",
        "golden", "gray", "grey", "white", "black",
        // setting and nature
        "sky", "sunset", "sunrise", "dawn", "dusk", "night", "ocean", "sea", "beach", "wave",
        "river", "lake", "mountain", "forest", "tree", "field", "desert", "snow", "rain", "fog",
        "mist", "cloud", "storm", "street", "city", "skyline", "room", "window", "door", "road",
        "bridge", "harbour", "harbor", "pier", "garden", "landscape", "horizon", "moon", "star",
        "sun", "fire", "smoke",
        // subjects
        "figure", "face", "crowd", "character", "woman", "man", "child", "person",
        "boat", "car", "train", "building", "tower",
        // scene vocabulary
        "scene", "visual", "image", "depicts", "shows", "showing",
    ])
}

fn default_mood_words() -> Vec<String> {
    words(&[
        "dramatic", "calm", "serene", "tense", "noir", "melancholy", "melancholic", "joyful",
        "eerie", "mysterious", "romantic", "ominous", "peaceful", "energetic", "somber",
        "sombre", "whimsical", "nostalgic", "hopeful", "gloomy", "dreamy", "playful", "epic",
        "intimate", "chaotic", "tranquil", "triumphant", "haunting", "cheerful", "lonely",
    ])
}

fn default_reduced_functionality() -> Vec<String> {
    words(&[
        "model_assigned_moods",
        "model_timestamps",
        "per_prompt_confidence",
        "structured_validation",
    ])
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_fragment_chars: default_min_fragment_chars(),
            max_prompts: default_max_prompts(),
            timestamp_spacing_secs: default_timestamp_spacing_secs(),
            min_keyword_overlap: default_min_keyword_overlap(),
            confidence_ceiling: default_confidence_ceiling(),
            visual_keywords: default_visual_keywords(),
            mood_words: default_mood_words(),
            reduced_functionality: default_reduced_functionality(),
        }
    }
}

//! Storyboard documents and their external wire representation.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// Mood used when a prompt does not name one.
pub const DEFAULT_MOOD: &str = "neutral";

fn default_mood() -> String {
    DEFAULT_MOOD.to_string()
}

/// Where a prompt came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptSource {
    /// Parsed from structured model output
    #[display("model")]
    Model,
    /// Mined from plain text by the fallback processor
    #[display("fallback")]
    Fallback,
    /// Parsed after a reconstruction repair
    #[display("reconstructed")]
    Reconstructed,
    /// Supplied by a person
    #[display("manual")]
    Manual,
}

impl PromptSource {
    /// Parse the serialized name of a source.
    pub fn from_name(name: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|source| source.as_ref() == name)
    }
}

/// One visual scene prompt.
///
/// # Examples
///
/// ```
/// use eisenstein_core::{StoryboardPromptBuilder, Timestamp};
///
/// let prompt = StoryboardPromptBuilder::default()
///     .text("A rainy neon street at night, wide shot, cold blue light")
///     .mood("noir")
///     .timestamp(Timestamp::from_seconds(15))
///     .build()
///     .unwrap();
///
/// assert_eq!(prompt.timestamp.to_string(), "00:15");
/// assert!(prompt.source.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct StoryboardPrompt {
    /// Visual description handed to image/video generation
    pub text: String,
    /// Mood or tone of the scene
    #[serde(default = "default_mood")]
    #[builder(default = "default_mood()")]
    pub mood: String,
    /// Offset of the scene
    #[builder(default)]
    pub timestamp: Timestamp,
    /// Provenance tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub source: Option<PromptSource>,
    /// Per-prompt confidence in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub confidence: Option<f64>,
}

impl StoryboardPrompt {
    /// The exact shape downstream generators consume.
    pub fn to_wire(&self) -> WirePrompt {
        WirePrompt {
            text: self.text.clone(),
            mood: self.mood.clone(),
            timestamp: self.timestamp.to_string(),
        }
    }
}

/// Ordered, non-empty list of prompts, each with non-empty text.
///
/// # Examples
///
/// ```
/// use eisenstein_core::{StoryboardDocument, StoryboardPromptBuilder};
///
/// assert!(StoryboardDocument::new(vec![]).is_none());
///
/// let prompt = StoryboardPromptBuilder::default()
///     .text("Sunrise over a misty harbour, slow pan")
///     .build()
///     .unwrap();
/// let doc = StoryboardDocument::new(vec![prompt]).unwrap();
/// assert_eq!(doc.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedStoryboard")]
pub struct StoryboardDocument {
    prompts: Vec<StoryboardPrompt>,
}

#[derive(Deserialize)]
struct UncheckedStoryboard {
    prompts: Vec<StoryboardPrompt>,
}

impl TryFrom<UncheckedStoryboard> for StoryboardDocument {
    type Error = String;

    fn try_from(value: UncheckedStoryboard) -> Result<Self, Self::Error> {
        StoryboardDocument::new(value.prompts).ok_or_else(|| {
            "storyboard needs at least one prompt and no prompt may have empty text".to_string()
        })
    }
}

impl StoryboardDocument {
    /// Build a document, refusing empty lists and blank prompt text.
    pub fn new(prompts: Vec<StoryboardPrompt>) -> Option<Self> {
        if prompts.is_empty() || prompts.iter().any(|p| p.text.trim().is_empty()) {
            return None;
        }
        Some(Self { prompts })
    }

    /// Prompts in scene order.
    pub fn prompts(&self) -> &[StoryboardPrompt] {
        &self.prompts
    }

    /// Consume the document, returning its prompts.
    pub fn into_prompts(self) -> Vec<StoryboardPrompt> {
        self.prompts
    }

    /// Number of prompts (always at least one).
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Always false; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Tag every prompt with the given source.
    pub fn with_source(mut self, source: PromptSource) -> Self {
        for prompt in &mut self.prompts {
            prompt.source = Some(source);
        }
        self
    }

    /// Convert into the external representation.
    pub fn to_wire(&self) -> WireStoryboard {
        WireStoryboard {
            prompts: self.prompts.iter().map(StoryboardPrompt::to_wire).collect(),
        }
    }
}

/// A prompt as seen by downstream image/video generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePrompt {
    /// Visual description
    pub text: String,
    /// Mood
    pub mood: String,
    /// Zero-padded `MM:SS`
    pub timestamp: String,
}

/// `{ "prompts": [ { "text", "mood", "timestamp" } ] }`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireStoryboard {
    /// Prompts in scene order
    pub prompts: Vec<WirePrompt>,
}

/// Metadata attached to a storyboard mined from plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackMetadata {
    /// Always [`PromptSource::Fallback`]
    pub source: PromptSource,
    /// Always `"text_based"`
    pub extraction_method: String,
    /// Heuristic trust in `[0, 1]`
    pub confidence: f64,
    /// Share of the source text's key words preserved in the prompts
    pub keyword_overlap: f64,
    /// True when the overlap fell below the configured minimum
    pub low_confidence: bool,
    /// Why structured extraction was abandoned
    pub reason: String,
}

/// Storyboard synthesised by the fallback processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStoryboard {
    #[serde(flatten)]
    document: StoryboardDocument,
    /// Fallback provenance
    pub metadata: FallbackMetadata,
}

impl BasicStoryboard {
    /// Wrap a mined document; every prompt is tagged as fallback output.
    pub fn new(document: StoryboardDocument, metadata: FallbackMetadata) -> Self {
        Self {
            document: document.with_source(PromptSource::Fallback),
            metadata,
        }
    }

    /// The mined document.
    pub fn document(&self) -> &StoryboardDocument {
        &self.document
    }

    /// Prompts in scene order.
    pub fn prompts(&self) -> &[StoryboardPrompt] {
        self.document.prompts()
    }

    /// Drop the metadata and keep the document.
    pub fn into_document(self) -> StoryboardDocument {
        self.document
    }
}

//! Fallback notifications and reasons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the pipeline fell back to plain-text mining.
///
/// The display form is the key used in the fallback reason counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No strategy found parseable JSON
    #[display("extraction_failed")]
    ExtractionFailed,
    /// JSON parsed but did not describe a storyboard, and repairs did not help
    #[display("validation_failed")]
    ValidationFailed,
    /// Sanitization removed every prompt's text
    #[display("sanitization_emptied")]
    SanitizationEmptied,
    /// Caller-supplied reason
    #[display("{}", _0)]
    Other(String),
}

impl From<&str> for FallbackReason {
    fn from(value: &str) -> Self {
        match value {
            "extraction_failed" => Self::ExtractionFailed,
            "validation_failed" => Self::ValidationFailed,
            "sanitization_emptied" => Self::SanitizationEmptied,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Notification kind; only one exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A fallback storyboard was generated
    FallbackUsed,
}

/// Delivered to registered callbacks each time a fallback storyboard is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct FallbackNotification {
    /// Always [`NotificationKind::FallbackUsed`]
    #[serde(rename = "type")]
    kind: NotificationKind,
    /// Human-readable summary
    message: String,
    /// Number of prompts the fallback produced
    extracted_prompt_count: usize,
    /// Capabilities missing from a fallback storyboard
    reduced_functionality: Vec<String>,
    /// Why fallback ran
    reason: String,
    /// When the fallback ran
    timestamp: DateTime<Utc>,
}

impl FallbackNotification {
    /// Build a `fallback_used` notification stamped with the current time.
    pub fn fallback_used(
        reason: &FallbackReason,
        extracted_prompt_count: usize,
        reduced_functionality: Vec<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::FallbackUsed,
            message: format!(
                "Structured storyboard extraction failed ({}); generated {} prompt(s) from plain text",
                reason, extracted_prompt_count
            ),
            extracted_prompt_count,
            reduced_functionality,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        }
    }
}

//! Fallback storyboard mining, notifications and extraction metrics.
//!
//! When no structured storyboard can be recovered from a model response,
//! [`FallbackProcessor`] mines the plain text for scene-like visual
//! descriptions and synthesises a minimal storyboard. Each successful
//! fallback updates the shared [`ExtractionMetrics`] and notifies every
//! callback in the [`NotificationRegistry`] exactly once.
//!
//! Metrics and the registry are ordinary values: construct fresh ones per
//! test or share clones across a process.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod metrics;
pub mod mining;
mod notifications;
mod processor;

pub use config::FallbackConfig;
pub use metrics::{ExtractionMetrics, MetricsSnapshot, MetricsSummary, ReasonCount, TOP_REASONS};
pub use notifications::{CallbackId, NotificationCallback, NotificationRegistry};
pub use processor::{FallbackProcessor, TEXT_BASED};

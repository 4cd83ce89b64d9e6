//! Storyboard pipeline and bounded orchestration loop.
//!
//! [`StoryboardPipeline`] turns one raw model response into a trusted
//! storyboard: format correction, multi-strategy extraction, validation,
//! reconstruction, sanitization and, when all of that fails, plain-text
//! fallback mining.
//!
//! [`Director`] drives a [`DirectorDriver`](eisenstein_interface::DirectorDriver)
//! through the states `START → AWAIT_MODEL → RUN_TOOLS/EVALUATE → DONE/ABORTED`,
//! feeding storyboard tool output through the pipeline and critique tool
//! output through [`parse_quality_score`]. A single iteration budget bounds
//! every run.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod conversation;
mod critique;
mod director;
mod pipeline;
mod tools;

pub use config::{DirectorConfig, EisensteinConfig};
pub use conversation::Conversation;
pub use critique::{SCORE_KEYS, parse_quality_score};
pub use director::{Director, DirectorReport, DirectorState};
pub use pipeline::{PipelineOutcome, StoryboardPipeline, StructuredStoryboard, string_leaves};
pub use tools::{ToolRegistry, sanitize_arguments};

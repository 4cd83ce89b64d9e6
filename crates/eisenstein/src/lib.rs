//! Eisenstein - turning LLM output into trusted storyboards
//!
//! Eisenstein takes the free-form text a language model returns when asked for a
//! storyboard and turns it into a validated, sanitized list of scene prompts. It
//! also runs the bounded tool-calling loop in which a model drafts, critiques
//! and refines that storyboard.
//!
//! # Features
//!
//! - **Format correction**: fences, comments, trailing commas, single quotes and bare keys
//! - **Extraction**: four strategies in fixed order, with a structured diagnosis on failure
//! - **Validation and repair**: field-level errors, then low-risk structural repairs
//! - **Sanitization**: script markup, protocol handlers, SQL and shell fragments removed
//! - **Fallback**: scene mining from plain text, with notifications and metrics
//! - **Director**: model rounds and tool calls under an iteration budget
//!
//! # Quick Start
//!
//! ```
//! use eisenstein::{PipelineOutcome, StoryboardPipeline};
//!
//! let pipeline = StoryboardPipeline::default();
//! let raw = "Sure!\n```json\n{\"prompts\": [{\"text\": \"A lighthouse in sea fog, wide shot\"}]}\n```";
//!
//! match pipeline.process(raw) {
//!     PipelineOutcome::Structured(storyboard) => {
//!         assert_eq!(storyboard.document.prompts()[0].timestamp.to_string(), "00:00");
//!     }
//!     other => panic!("expected a structured storyboard, got {:?}", other),
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - OpenTelemetry span export through `tracing-opentelemetry`
//!
//! # Architecture
//!
//! - `eisenstein_error` - Error types
//! - `eisenstein_core` - Storyboard data model, messages, tool calls
//! - `eisenstein_interface` - `DirectorDriver` and `DirectorTool` traits
//! - `eisenstein_extract` - Format corrector, extraction engine, validator
//! - `eisenstein_security` - Content sanitizer
//! - `eisenstein_fallback` - Fallback miner, metrics, notifications
//! - `eisenstein_director` - Storyboard pipeline and orchestration loop
//!
//! This crate (`eisenstein`) re-exports everything for convenience.

pub use eisenstein_core::*;
pub use eisenstein_director::*;
pub use eisenstein_error::*;
pub use eisenstein_extract::*;
pub use eisenstein_fallback::*;
pub use eisenstein_interface::*;
pub use eisenstein_security::*;

mod script;

pub use script::{Script, ScriptedDriver, ScriptedTool, ToolScript};

mod observability;

pub use observability::{ObservabilityConfig, init_observability};

//! Core data types for the Eisenstein storyboard director.
//!
//! This crate holds the value types shared by every stage of the pipeline:
//! conversation messages exchanged with the model, the storyboard document
//! and its wire format, and the notifications emitted by fallback mining.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod method;
mod notification;
mod role;
mod storyboard;
mod timestamp;
mod tool_call;

pub use message::Message;
pub use method::ExtractionMethod;
pub use notification::{FallbackNotification, FallbackReason, NotificationKind};
pub use role::Role;
pub use storyboard::{
    BasicStoryboard, DEFAULT_MOOD, FallbackMetadata, PromptSource, StoryboardDocument,
    StoryboardPrompt, StoryboardPromptBuilder, StoryboardPromptBuilderError, WirePrompt,
    WireStoryboard,
};
pub use timestamp::Timestamp;
pub use tool_call::{ModelResponse, ToolCall};

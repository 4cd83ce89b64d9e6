//! Interfaces consumed by the Eisenstein storyboard director.
//!
//! The director never talks to a model provider or a rendering service
//! directly. It drives a [`DirectorDriver`] for model turns and a set of
//! [`DirectorTool`]s for everything the model asks to have done.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{DirectorDriver, DirectorTool};
pub use types::ToolDefinition;

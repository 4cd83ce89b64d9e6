//! Error types for the Eisenstein storyboard director.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Only infrastructure failures live here. A model that answers with
//! broken JSON is an expected input, not an error.
//!
//! # Examples
//!
//! ```
//! use eisenstein_error::{EisensteinResult, IoError};
//!
//! fn read_transcript() -> EisensteinResult<String> {
//!     Err(IoError::new("transcript.toml not found"))?
//! }
//!
//! assert!(read_transcript().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod director;
mod error;
mod io;
mod json;
mod model;
mod tool;

pub use config::ConfigError;
pub use director::{DirectorError, DirectorErrorKind};
pub use error::{EisensteinError, EisensteinErrorKind, EisensteinResult};
pub use io::IoError;
pub use json::JsonError;
pub use model::{ModelError, ModelErrorKind};
pub use tool::ToolError;

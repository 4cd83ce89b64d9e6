//! Sanitization of untrusted storyboard content.
//!
//! Everything a model writes is untrusted. Before a storyboard reaches image
//! or video generation, every string field is passed through a
//! [`ContentSanitizer`], which strips:
//!
//! - script, iframe, style and other embedding markup
//! - inline event handlers (`onclick=` and siblings)
//! - `javascript:`-style protocol handlers and executable data URIs
//! - SQL-injection-shaped fragments (`; DROP TABLE ...`, `UNION SELECT`)
//! - shell command substitutions (`` `cmd` ``, `$(cmd)`, `${VAR}`)
//!
//! Legitimate prose passes through unchanged.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod sanitizer;

pub use error::{SecurityError, SecurityErrorKind, SecurityResult};
pub use sanitizer::{ContentSanitizer, SanitizedText, SanitizerConfig};

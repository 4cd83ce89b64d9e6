//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the eisenstein binary.

mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{correct, direct, extract, load_config, read_input, sanitize, validate};

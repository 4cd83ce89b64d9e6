//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a message in the director conversation.
///
/// # Examples
///
/// ```
/// use eisenstein_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::Tool), "Tool");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The director persona and standing instructions
    System,
    /// Task statements and refinement requests
    User,
    /// Model turns, possibly carrying tool calls
    Assistant,
    /// Results of tool invocations
    Tool,
}

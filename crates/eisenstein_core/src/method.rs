//! Structured extraction strategies.

use serde::{Deserialize, Serialize};

/// Parsing strategy that produced (or failed to produce) a document.
///
/// Strategies are always tried in declaration order.
///
/// # Examples
///
/// ```
/// use eisenstein_core::ExtractionMethod;
///
/// let order = ExtractionMethod::in_order();
/// assert_eq!(order[0], ExtractionMethod::FenceBlock);
/// assert_eq!(ExtractionMethod::BracketMatch.to_string(), "BRACKET_MATCH");
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
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    /// Contents of a fenced code block
    #[display("FENCE_BLOCK")]
    FenceBlock,
    /// Object anchored on a known storyboard key
    #[display("REGEX_PATTERN")]
    RegexPattern,
    /// First balanced top-level object or array
    #[display("BRACKET_MATCH")]
    BracketMatch,
}

impl ExtractionMethod {
    /// All strategies in the order the extractor tries them.
    pub fn in_order() -> Vec<ExtractionMethod> {
        use strum::IntoEnumIterator;
        Self::iter().collect()
    }
}

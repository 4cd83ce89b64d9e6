//! Structured-output handling for the Eisenstein storyboard director.
//!
//! Model output arrives as untrusted text. This crate turns it into a
//! storyboard in three steps:
//!
//! - **Format correction**: cheap textual repairs (fences, commentary,
//!   trailing commas, quotes, comments) applied by [`FormatCorrector`]
//! - **Extraction**: [`JsonExtractor`] tries fence, key-anchored and
//!   bracket-matching strategies in order and records every attempt
//! - **Validation**: [`StoryboardValidator`] checks the storyboard shape,
//!   reports field-level errors and can reconstruct almost-valid documents
//!
//! Malformed input is never an error here: failures are values
//! ([`ExtractionOutcome::Failed`], [`ValidationOutcome::Invalid`]).
//!
//! # Example
//!
//! ```
//! use eisenstein_extract::{JsonExtractor, StoryboardValidator, ValidationOutcome};
//!
//! let raw = "Here's the result:\n\n```json\n{\"prompts\":[{\"text\":\"A rainy neon street at night, wide shot, cold blue light\",\"mood\":\"noir\",\"timestamp\":\"00:15\"}]}\n```\n\nEnjoy!";
//!
//! let mut extractor = JsonExtractor::default();
//! let extracted = extractor.extract_json(raw).expect("fenced JSON");
//!
//! let ValidationOutcome::Valid(storyboard) = StoryboardValidator::default().validate_document(extracted.data()) else {
//!     panic!("storyboard should validate");
//! };
//! assert_eq!(storyboard.prompts()[0].mood, "noir");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod corrector;
mod extractor;
mod parse_error;
mod reconstruction;
mod scan;
mod validation;

pub use corrector::{
    CORRECTIONS, Correction, CorrectionResult, CorrectorConfig, FormatCorrector,
    convert_single_quotes, escape_control_characters, needs_correction, quote_bare_keys,
    remove_trailing_commas, strip_comments, strip_generic_fences, strip_language_fences,
    strip_surrounding_text,
};
pub use extractor::{
    BRACKET_CONFIDENCE, ExtractedDocument, ExtractionOutcome, FENCE_CONFIDENCE, JsonExtractor,
    MethodFailure, REGEX_CONFIDENCE,
};
pub use parse_error::{ParseError, ParseErrorKind};
pub use reconstruction::{
    PAYLOAD_KEYS, REPAIRS, Reconstruction, Repair, coerce_single_prompt, decode_json_string,
    promote_string_prompts, rename_prompt_array_alias, rename_text_aliases,
    unwrap_nested_payload, wrap_top_level_array,
};
pub use validation::{
    FieldError, PROMPT_ARRAY_ALIASES, StoryboardValidator, TEXT_ALIASES, ValidationOutcome,
    ValidationResult, ValidatorConfig,
};

//! Model invocation errors.

/// Specific error conditions raised by a model driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ModelErrorKind {
    /// The provider rejected the request
    #[display("Request rejected by provider: {}", _0)]
    Rejected(String),
    /// The provider could not be reached
    #[display("Provider unavailable: {}", _0)]
    Unavailable(String),
    /// The provider answered with something the driver cannot decode at all
    #[display("Undecodable provider response: {}", _0)]
    Undecodable(String),
    /// A scripted or mock driver ran out of responses
    #[display("No more responses scripted after {} turns", _0)]
    ScriptExhausted(usize),
}

/// Model invocation error with location tracking.
///
/// # Examples
///
/// ```
/// use eisenstein_error::{ModelError, ModelErrorKind};
///
/// let err = ModelError::new(ModelErrorKind::Unavailable("connection refused".to_string()));
/// assert!(format!("{}", err).contains("unavailable"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Model Error: {} at line {} in {}", kind, line, file)]
pub struct ModelError {
    /// The specific error condition
    pub kind: ModelErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ModelError {
    /// Create a new ModelError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ModelErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

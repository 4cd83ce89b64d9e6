//! Orchestration loop errors.

/// Specific error conditions for a director run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DirectorErrorKind {
    /// The model driver failed and the run cannot continue
    #[display("Model invocation failed in round {}: {}", round, message)]
    ModelInvocation {
        /// Model round (1-based) that failed
        round: u32,
        /// Underlying error message
        message: String,
    },
    /// The run was configured with an unusable budget or threshold
    #[display("Invalid director configuration: {}", _0)]
    InvalidConfiguration(String),
    /// Script file for the scripted driver could not be used
    #[display("Invalid script: {}", _0)]
    InvalidScript(String),
}

/// Error type for director runs.
///
/// # Examples
///
/// ```
/// use eisenstein_error::{DirectorError, DirectorErrorKind};
///
/// let err = DirectorError::new(DirectorErrorKind::InvalidConfiguration(
///     "max_iterations is zero".to_string(),
/// ));
/// assert!(format!("{}", err).contains("max_iterations"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Director Error: {} at line {} in {}", kind, line, file)]
pub struct DirectorError {
    /// The specific error condition
    pub kind: DirectorErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl DirectorError {
    /// Create a new DirectorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DirectorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

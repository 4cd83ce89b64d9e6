//! Top-level error wrapper types.

use crate::{ConfigError, DirectorError, IoError, JsonError, ModelError, ToolError};

/// Every infrastructure failure an Eisenstein crate can surface.
///
/// Malformed model output is deliberately absent: extraction, validation,
/// sanitization and fallback report it through typed outcomes instead.
///
/// # Examples
///
/// ```
/// use eisenstein_error::{EisensteinError, ConfigError};
///
/// let err: EisensteinError = ConfigError::new("bad threshold").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum EisensteinErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// File or stream I/O error
    #[from(IoError)]
    Io(IoError),
    /// Model driver error
    #[from(ModelError)]
    Model(ModelError),
    /// Tool execution error
    #[from(ToolError)]
    Tool(ToolError),
    /// Orchestration loop error
    #[from(DirectorError)]
    Director(DirectorError),
}

/// Eisenstein error with kind discrimination.
///
/// # Examples
///
/// ```
/// use eisenstein_error::{EisensteinResult, ModelError, ModelErrorKind};
///
/// fn call_model() -> EisensteinResult<String> {
///     Err(ModelError::new(ModelErrorKind::Rejected("quota".to_string())))?
/// }
///
/// assert!(call_model().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Eisenstein Error: {}", _0)]
pub struct EisensteinError(Box<EisensteinErrorKind>);

impl EisensteinError {
    /// Create a new error from a kind.
    pub fn new(kind: EisensteinErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &EisensteinErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to EisensteinErrorKind
impl<T> From<T> for EisensteinError
where
    T: Into<EisensteinErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Eisenstein operations.
pub type EisensteinResult<T> = std::result::Result<T, EisensteinError>;

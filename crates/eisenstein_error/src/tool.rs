//! Tool execution errors.

/// Tool execution error with source location.
///
/// The orchestration loop absorbs these: a failing tool becomes a failure
/// string in the conversation history, never an aborted run.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Tool Error: '{}' failed: {} at line {} in {}", tool, message, line, file)]
pub struct ToolError {
    /// Name of the tool that failed
    pub tool: String,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ToolError {
    /// Create a new ToolError for the named tool at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use eisenstein_error::ToolError;
    ///
    /// let err = ToolError::new("generate_storyboard", "upstream timeout");
    /// assert_eq!(err.tool, "generate_storyboard");
    /// ```
    #[track_caller]
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            tool: tool.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Core type definitions for the Eisenstein interface.

use serde::{Deserialize, Serialize};

/// Definition of a tool the model may call.
///
/// # Examples
///
/// ```
/// use eisenstein_interface::ToolDefinition;
/// use serde_json::json;
///
/// let def = ToolDefinition {
///     name: "critique_storyboard".to_string(),
///     description: "Scores a storyboard".to_string(),
///     parameters: json!({"type": "object", "properties": {"storyboard": {"type": "string"}}}),
/// };
/// assert_eq!(def.parameter_type("storyboard"), Some("string"));
/// assert_eq!(def.parameter_type("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool/function
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the parameters this tool accepts
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Declared JSON type of a named parameter, if the schema states one.
    pub fn parameter_type(&self, parameter: &str) -> Option<&str> {
        self.parameters
            .get("properties")?
            .get(parameter)?
            .get("type")?
            .as_str()
    }

    /// Names of the parameters the schema marks as required.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
            .unwrap_or_default()
    }
}

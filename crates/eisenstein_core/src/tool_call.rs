//! Model responses and the tool calls they carry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tool/function call made by the model.
///
/// # Examples
///
/// ```
/// use eisenstein_core::ToolCall;
/// use serde_json::json;
///
/// let call = ToolCall::new("call_1", "generate_storyboard", json!({"concept": "noir"}));
/// assert_eq!(call.name, "generate_storyboard");
/// assert_eq!(call.argument_map().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments to pass to the tool (as JSON)
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a name/value map. Non-object arguments yield an empty map.
    pub fn argument_map(&self) -> HashMap<String, serde_json::Value> {
        match &self.arguments {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => HashMap::new(),
        }
    }
}

/// What a model driver returns for one round.
///
/// # Examples
///
/// ```
/// use eisenstein_core::ModelResponse;
///
/// let response = ModelResponse::text("All done.");
/// assert!(!response.has_tool_calls());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Free text produced by the model
    #[serde(default)]
    pub content: String,
    /// Tool calls requested by the model, in order
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    /// A response with text only.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A response requesting tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    /// True when the model asked for at least one tool.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

//! Tool lookup and argument normalisation.

use eisenstein_error::EisensteinResult;
use eisenstein_interface::{DirectorTool, ToolDefinition};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Tools available to a director run, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn DirectorTool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: impl DirectorTool + 'static) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    /// Adds a shared tool, replacing any tool with the same name.
    pub fn register_arc(&mut self, tool: Arc<dyn DirectorTool>) -> &mut Self {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(tool);
        self
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DirectorTool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// True when a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Definitions handed to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool with null arguments replaced.
    ///
    /// An unknown name is not an error: the model is told `Unknown tool: <name>`.
    #[tracing::instrument(skip(self, args))]
    pub async fn invoke(&self, name: &str, args: &Value) -> EisensteinResult<String> {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Model requested an unregistered tool");
            return Ok(format!("Unknown tool: {}", name));
        };
        let args = sanitize_arguments(&tool.definition(), args);
        tracing::debug!(%args, "Invoking tool");
        tool.execute(args).await
    }
}

/// Replace null arguments with type-appropriate empty values.
///
/// Array-typed parameters become `[]`, everything else `""`. Required
/// parameters the model left out are filled the same way. Non-object
/// arguments are treated as an empty object.
///
/// # Examples
///
/// ```
/// use eisenstein_director::sanitize_arguments;
/// use eisenstein_interface::ToolDefinition;
/// use serde_json::json;
///
/// let def = ToolDefinition {
///     name: "generate_storyboard".to_string(),
///     description: "Drafts scenes".to_string(),
///     parameters: json!({
///         "type": "object",
///         "properties": {"theme": {"type": "string"}, "moods": {"type": "array"}},
///         "required": ["theme", "moods"]
///     }),
/// };
///
/// let args = sanitize_arguments(&def, &json!({"theme": null}));
/// assert_eq!(args, json!({"theme": "", "moods": []}));
/// ```
pub fn sanitize_arguments(definition: &ToolDefinition, args: &Value) -> Value {
    let mut map: Map<String, Value> = match args {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let nulls: Vec<String> = map
        .iter()
        .filter(|(_, value)| value.is_null())
        .map(|(key, _)| key.clone())
        .collect();
    for key in nulls {
        let empty = empty_value(definition.parameter_type(&key));
        map.insert(key, empty);
    }

    for required in definition.required_parameters() {
        if !map.contains_key(required) {
            map.insert(
                required.to_string(),
                empty_value(definition.parameter_type(required)),
            );
        }
    }

    Value::Object(map)
}

fn empty_value(declared_type: Option<&str>) -> Value {
    match declared_type {
        Some("array") => Value::Array(Vec::new()),
        _ => Value::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition() -> ToolDefinition {
        ToolDefinition {
            name: "critique_storyboard".to_string(),
            description: "Scores a storyboard".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "storyboard": {"type": "string"},
                    "criteria": {"type": "array", "items": {"type": "string"}},
                    "strict": {"type": "boolean"}
                },
                "required": ["storyboard"]
            }),
        }
    }

    #[test]
    fn test_nulls_become_typed_defaults() {
        let args = sanitize_arguments(
            &definition(),
            &json!({"storyboard": null, "criteria": null, "strict": true, "extra": null}),
        );
        assert_eq!(
            args,
            json!({"storyboard": "", "criteria": [], "strict": true, "extra": ""})
        );
    }

    #[test]
    fn test_missing_required_is_filled() {
        assert_eq!(
            sanitize_arguments(&definition(), &Value::Null),
            json!({"storyboard": ""})
        );
    }

    #[test]
    fn test_present_values_untouched() {
        let args = json!({"storyboard": "{\"prompts\": []}", "criteria": ["pacing"]});
        assert_eq!(sanitize_arguments(&definition(), &args), args);
    }
}

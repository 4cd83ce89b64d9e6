//! Offline replay of a director conversation from a TOML transcript.
//!
//! A script lists the model turns in order and the canned output of each tool:
//!
//! ```toml
//! [[turns]]
//! content = "Drafting the storyboard."
//! [[turns.tool_calls]]
//! id = "call_1"
//! name = "generate_storyboard"
//! arguments = { theme = "rain" }
//!
//! [[turns]]
//! content = "The storyboard is final."
//!
//! [[tools]]
//! name = "generate_storyboard"
//! outputs = ['{"prompts": [{"text": "A rainy neon street at night", "timestamp": "00:00"}]}']
//! ```

use async_trait::async_trait;
use eisenstein_core::{Message, ModelResponse};
use eisenstein_director::ToolRegistry;
use eisenstein_error::{
    DirectorError, DirectorErrorKind, EisensteinResult, IoError, ModelError, ModelErrorKind,
};
use eisenstein_interface::{DirectorDriver, DirectorTool, ToolDefinition};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{HashSet, VecDeque};
use std::path::Path;

/// One scripted tool: name, schema and the outputs it answers with, in turn.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolScript {
    /// Tool name
    pub name: String,
    /// Description shown to the model
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments; an empty object schema when absent
    #[serde(default)]
    pub parameters: Option<Value>,
    /// Outputs in call order; the last one repeats
    pub outputs: Vec<String>,
}

/// A recorded conversation: model turns plus tool outputs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    /// Model turns in order
    pub turns: Vec<ModelResponse>,
    /// Tools the model may call
    #[serde(default)]
    pub tools: Vec<ToolScript>,
}

impl Script {
    /// Parse a script from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid script.
    pub fn parse(text: &str) -> EisensteinResult<Self> {
        let script: Self = toml::from_str(text)
            .map_err(|e| DirectorError::new(DirectorErrorKind::InvalidScript(e.to_string())))?;
        script.check()?;
        Ok(script)
    }

    /// Read and parse a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid script.
    pub fn from_file(path: impl AsRef<Path>) -> EisensteinResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| IoError::new(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    fn check(&self) -> EisensteinResult<()> {
        let invalid = |message: String| -> EisensteinResult<()> {
            Err(DirectorError::new(DirectorErrorKind::InvalidScript(message)).into())
        };

        if self.turns.is_empty() {
            return invalid("script has no turns".to_string());
        }
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return invalid("tool with an empty name".to_string());
            }
            if !seen.insert(tool.name.as_str()) {
                return invalid(format!("tool {} is defined twice", tool.name));
            }
            if tool.outputs.is_empty() {
                return invalid(format!("tool {} has no outputs", tool.name));
            }
        }
        Ok(())
    }

    /// Split into a driver replaying the turns and a registry of replaying tools.
    pub fn into_parts(self) -> (ScriptedDriver, ToolRegistry) {
        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(ScriptedTool::new(tool));
        }
        (ScriptedDriver::new(self.turns), registry)
    }
}

/// Model driver that replays scripted turns and fails once they run out.
#[derive(Debug)]
pub struct ScriptedDriver {
    turns: Mutex<VecDeque<ModelResponse>>,
    served: Mutex<usize>,
}

impl ScriptedDriver {
    /// Replay `turns` in order.
    pub fn new(turns: Vec<ModelResponse>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            served: Mutex::new(0),
        }
    }

    /// Turns replayed so far.
    pub fn served(&self) -> usize {
        *self.served.lock()
    }

    /// Turns not yet replayed.
    pub fn remaining(&self) -> usize {
        self.turns.lock().len()
    }
}

#[async_trait]
impl DirectorDriver for ScriptedDriver {
    async fn invoke(
        &self,
        history: &[Message],
        _tools: &[ToolDefinition],
    ) -> EisensteinResult<ModelResponse> {
        let mut served = self.served.lock();
        match self.turns.lock().pop_front() {
            Some(turn) => {
                *served += 1;
                tracing::debug!(turn = *served, history = history.len(), "Replaying scripted turn");
                Ok(turn)
            }
            None => Err(ModelError::new(ModelErrorKind::ScriptExhausted(*served)).into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "script"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Tool answering with scripted outputs in turn, repeating the last.
#[derive(Debug)]
pub struct ScriptedTool {
    name: String,
    description: String,
    parameters: Value,
    outputs: Mutex<VecDeque<String>>,
}

impl ScriptedTool {
    /// Build a tool from its script entry.
    pub fn new(script: ToolScript) -> Self {
        Self {
            name: script.name,
            description: script.description,
            parameters: script
                .parameters
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            outputs: Mutex::new(script.outputs.into()),
        }
    }
}

#[async_trait]
impl DirectorTool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, args: Value) -> EisensteinResult<String> {
        tracing::debug!(tool = %self.name, %args, "Replaying scripted tool output");
        let mut outputs = self.outputs.lock();
        let output = if outputs.len() > 1 {
            outputs.pop_front()
        } else {
            outputs.front().cloned()
        };
        Ok(output.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
[[turns]]
content = "Drafting."
[[turns.tool_calls]]
id = "call_1"
name = "generate_storyboard"
arguments = { theme = "rain" }

[[turns]]
content = "Final."

[[tools]]
name = "generate_storyboard"
description = "Drafts scenes"
outputs = ["first", "second"]
"#;

    #[test]
    fn test_parse_script() {
        let script = Script::parse(SCRIPT).unwrap();
        assert_eq!(script.turns.len(), 2);
        assert_eq!(script.turns[0].tool_calls[0].name, "generate_storyboard");
        assert_eq!(script.turns[0].tool_calls[0].arguments, json!({"theme": "rain"}));
        assert!(!script.turns[1].has_tool_calls());
        assert_eq!(script.tools[0].outputs, vec!["first", "second"]);
    }

    #[test]
    fn test_rejects_bad_scripts() {
        assert!(Script::parse("turns = []").is_err());
        assert!(Script::parse("not toml at all [").is_err());

        let no_outputs = "[[turns]]\ncontent = \"x\"\n[[tools]]\nname = \"t\"\noutputs = []\n";
        assert!(Script::parse(no_outputs).is_err());

        let twice = "[[turns]]\ncontent = \"x\"\n\
                     [[tools]]\nname = \"t\"\noutputs = [\"a\"]\n\
                     [[tools]]\nname = \"t\"\noutputs = [\"b\"]\n";
        assert!(Script::parse(twice).is_err());
    }

    #[tokio::test]
    async fn test_driver_replays_then_exhausts() {
        let (driver, _) = Script::parse(SCRIPT).unwrap().into_parts();
        assert!(driver.invoke(&[], &[]).await.unwrap().has_tool_calls());
        assert_eq!(driver.invoke(&[], &[]).await.unwrap().content, "Final.");
        assert_eq!(driver.served(), 2);

        let err = driver.invoke(&[], &[]).await.unwrap_err();
        assert!(err.to_string().contains("after 2 turns"));
    }

    #[tokio::test]
    async fn test_tool_repeats_last_output() {
        let (_, tools) = Script::parse(SCRIPT).unwrap().into_parts();
        let args = json!({});
        assert_eq!(tools.invoke("generate_storyboard", &args).await.unwrap(), "first");
        assert_eq!(tools.invoke("generate_storyboard", &args).await.unwrap(), "second");
        assert_eq!(tools.invoke("generate_storyboard", &args).await.unwrap(), "second");
    }
}

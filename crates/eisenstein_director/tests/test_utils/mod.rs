//! Mock driver and tools for director tests.

#![allow(dead_code)]

use async_trait::async_trait;
use eisenstein_core::{Message, ModelResponse, ToolCall};
use eisenstein_error::{EisensteinResult, ModelError, ModelErrorKind, ToolError};
use eisenstein_interface::{DirectorDriver, DirectorTool, ToolDefinition};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;

/// Behavior configuration for the mock driver.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Replay these turns, then answer "Done." forever
    Sequence(Vec<ModelResponse>),
    /// Always answer with this text and no tool calls
    AlwaysText(String),
    /// Always fail
    Error(String),
}

/// Mock model driver recording every conversation it is sent.
#[derive(Debug)]
pub struct MockDriver {
    behavior: MockBehavior,
    queue: Mutex<VecDeque<ModelResponse>>,
    histories: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockDriver {
    pub fn new(behavior: MockBehavior) -> Self {
        let queue = match &behavior {
            MockBehavior::Sequence(turns) => turns.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            behavior,
            queue: Mutex::new(queue),
            histories: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sequence(turns: Vec<ModelResponse>) -> Self {
        Self::new(MockBehavior::Sequence(turns))
    }

    /// Number of model rounds served.
    pub fn call_count(&self) -> usize {
        self.histories.lock().len()
    }

    /// Conversation sent on the last round.
    pub fn last_history(&self) -> Vec<Message> {
        self.histories.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DirectorDriver for MockDriver {
    async fn invoke(
        &self,
        history: &[Message],
        _tools: &[ToolDefinition],
    ) -> EisensteinResult<ModelResponse> {
        self.histories.lock().push(history.to_vec());
        match &self.behavior {
            MockBehavior::Sequence(_) => Ok(self
                .queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| ModelResponse::text("Done."))),
            MockBehavior::AlwaysText(text) => Ok(ModelResponse::text(text.clone())),
            MockBehavior::Error(message) => {
                Err(ModelError::new(ModelErrorKind::Unavailable(message.clone())).into())
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-director"
    }
}

/// Mock tool replaying canned outputs and recording the arguments it received.
pub struct MockTool {
    name: String,
    schema: Value,
    outputs: Mutex<VecDeque<Result<String, String>>>,
    calls: Arc<Mutex<Vec<Value>>>,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl MockTool {
    /// Tool answering with `outputs` in turn, repeating the last one.
    pub fn returning(name: &str, outputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            schema: json!({"type": "object", "properties": {}}),
            outputs: Mutex::new(outputs.iter().map(|o| Ok(o.to_string())).collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
            log: None,
        }
    }

    /// Tool that always fails.
    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            outputs: Mutex::new(VecDeque::from([Err(message.to_string())])),
            ..Self::returning(name, &[])
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.log = Some(log);
        self
    }

    /// Handle to the recorded arguments, usable after the tool is registered.
    pub fn calls(&self) -> Arc<Mutex<Vec<Value>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl DirectorTool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Mock tool for testing"
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, args: Value) -> EisensteinResult<String> {
        self.calls.lock().push(args);
        if let Some(log) = &self.log {
            log.lock().push(format!("start:{}", self.name));
        }
        tokio::task::yield_now().await;
        if let Some(log) = &self.log {
            log.lock().push(format!("end:{}", self.name));
        }

        let output = {
            let mut outputs = self.outputs.lock();
            if outputs.len() > 1 {
                outputs.pop_front()
            } else {
                outputs.front().cloned()
            }
        };
        match output {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ToolError::new(&self.name, message).into()),
            None => Ok(String::new()),
        }
    }
}

/// A model turn requesting one tool call.
pub fn call(id: &str, name: &str, args: Value) -> ModelResponse {
    ModelResponse::with_tool_calls("", vec![ToolCall::new(id, name, args)])
}

/// The storyboard from the fenced end-to-end scenario.
pub const FENCED_STORYBOARD: &str = "Here's the result:\n\n```json\n{\"prompts\":[{\"text\":\"A rainy neon street at night, wide shot, cold blue light\",\"mood\":\"noir\",\"timestamp\":\"00:15\"}]}\n```\n\nEnjoy!";

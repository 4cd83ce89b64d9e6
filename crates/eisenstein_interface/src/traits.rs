//! Trait definitions for the collaborators the director consumes.

use crate::ToolDefinition;
use async_trait::async_trait;
use eisenstein_core::{Message, ModelResponse};
use eisenstein_error::EisensteinResult;

/// A generative model the director converses with.
///
/// Implementations only transport the conversation. Persona, task and
/// history are assembled by the director; prompt templating belongs to
/// whoever builds the task text.
#[async_trait]
pub trait DirectorDriver: Send + Sync {
    /// Send the full conversation and return the model's next turn.
    ///
    /// Errors returned here are infrastructure failures and end the run.
    async fn invoke(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> EisensteinResult<ModelResponse>;

    /// Provider name (e.g., "anthropic", "gemini", "scripted").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// A tool the model may ask the director to run.
#[async_trait]
pub trait DirectorTool: Send + Sync {
    /// Tool name as the model refers to it.
    fn name(&self) -> &str;

    /// Tool description for the model.
    fn description(&self) -> &str;

    /// JSON Schema of the arguments.
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool. Arguments have already had nulls replaced.
    async fn execute(&self, args: serde_json::Value) -> EisensteinResult<String>;

    /// Definition handed to the model.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

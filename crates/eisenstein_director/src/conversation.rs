//! Conversation history for one director run.

use eisenstein_core::{Message, ModelResponse, Role, ToolCall};

/// Ordered conversation: persona, task, then model and tool turns.
///
/// Nothing is ever dropped; the model always sees the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation opening with a system persona.
    #[must_use]
    pub fn with_system_prompt(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        let mut conversation = Self::new();
        if !persona.trim().is_empty() {
            conversation.messages.push(Message::system(persona));
        }
        conversation
    }

    /// Adds a user message.
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Adds the model's turn, including any tool calls it requested.
    pub fn add_model_turn(&mut self, response: &ModelResponse) {
        self.messages.push(Message::assistant(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
    }

    /// Adds the output of one tool call.
    pub fn add_tool_result(&mut self, call: &ToolCall, output: impl Into<String>) {
        self.messages.push(Message::tool_result(call, output));
    }

    /// Every message, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing has been said.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of model turns so far.
    #[must_use]
    pub fn model_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_is_preserved() {
        let mut conversation = Conversation::with_system_prompt("You direct storyboards.");
        conversation.add_user_message("A chase across rooftops");
        let call = ToolCall::new("call-1", "generate_storyboard", json!({"theme": "chase"}));
        conversation.add_model_turn(&ModelResponse::with_tool_calls("", vec![call.clone()]));
        conversation.add_tool_result(&call, "{\"prompts\": []}");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::Tool]);
        assert_eq!(conversation.messages()[3].tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(conversation.model_turns(), 1);
    }

    #[test]
    fn test_blank_persona_is_omitted() {
        assert!(Conversation::with_system_prompt("  ").is_empty());
    }
}

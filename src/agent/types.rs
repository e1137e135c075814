//! Type definitions for the agent module

use serde::{Deserialize, Serialize};

/// Conversational role understood by the model backend.
///
/// The backend only knows two speakers, so instructions are sent as
/// `User` content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human-equivalent speaker
    User,
    /// Model-equivalent speaker
    Model,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message sent to the model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Text payload
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new model message
    pub fn model(content: impl Into<String>) -> Self {
        Message {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Token usage statistics for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub input_tokens: u32,
    /// Tokens in the generated candidate
    pub output_tokens: u32,
    /// Total tokens billed
    pub total_tokens: u32,
}

/// Flattened result of one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    /// Generated text of the first candidate
    pub text: String,
    /// Token usage for the call
    pub usage: TokenUsage,
    /// Finish reason label reported by the backend (e.g. `STOP`)
    pub finish_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Xin chào");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Xin chào");
        assert_eq!(Message::model("Chào bạn").role, Role::Model);
    }
}

//! Persisted record shapes
//!
//! Turns and cache entries keep the document layout used by the
//! conversation store, so records written here stay readable by other
//! consumers of the same collections.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::agent::types::{Message, ModelResponse, Role, TokenUsage};

/// JSON object with arbitrary keys
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Type tag of a stored turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    /// Written on behalf of the customer
    Human,
    /// Generated by the model
    Ai,
}

impl TurnKind {
    /// Backend role for this turn type
    pub fn role(self) -> Role {
        match self {
            TurnKind::Human => Role::User,
            TurnKind::Ai => Role::Model,
        }
    }

    /// Turn type for a backend role
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::User => TurnKind::Human,
            Role::Model => TurnKind::Ai,
        }
    }
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnKind::Human => write!(f, "human"),
            TurnKind::Ai => write!(f, "ai"),
        }
    }
}

/// Token counts as stored on ai turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl From<TokenUsage> for UsageMetadata {
    fn from(usage: TokenUsage) -> Self {
        UsageMetadata {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Response metadata; empty for human turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Message payload of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnData {
    #[serde(rename = "type")]
    pub kind: TurnKind,
    /// Canonical content (the customer's original words for human turns)
    pub content: String,
    /// Augmented text actually sent to the model (human turns only)
    #[serde(default)]
    pub enhanced_content: Option<String>,
    #[serde(default)]
    pub additional_kwargs: Metadata,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl TurnData {
    /// Payload for a customer message
    pub fn human(original: impl Into<String>, enhanced: impl Into<String>) -> Self {
        TurnData {
            kind: TurnKind::Human,
            content: original.into(),
            enhanced_content: Some(enhanced.into()),
            additional_kwargs: Metadata::new(),
            response_metadata: ResponseMetadata::default(),
            name: None,
            id: None,
            usage_metadata: None,
        }
    }

    /// Payload for a model reply; usage and finish reason come from the
    /// call that produced it.
    pub fn ai(response: &ModelResponse, model_name: &str) -> Self {
        let usage = UsageMetadata::from(response.usage);
        TurnData {
            kind: TurnKind::Ai,
            content: response.text.clone(),
            enhanced_content: None,
            additional_kwargs: Metadata::new(),
            response_metadata: ResponseMetadata {
                usage: Some(usage),
                model_name: Some(model_name.to_string()),
                finish_reason: Some(response.finish_reason.clone()),
            },
            name: None,
            id: Some(Utc::now().to_rfc3339()),
            usage_metadata: Some(usage),
        }
    }

    /// The text that represents this turn in a prompt.
    ///
    /// History replays `content`, which for human turns is the original
    /// message rather than the enhanced one.
    pub fn prompt_text(&self) -> &str {
        &self.content
    }
}

/// Typed wrapper around a turn payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnHistory {
    #[serde(rename = "type")]
    pub kind: TurnKind,
    pub data: TurnData,
}

/// One persisted conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "SessionId")]
    pub session_id: String,
    #[serde(rename = "History")]
    pub history: TurnHistory,
}

impl Turn {
    fn from_data(session_id: impl Into<String>, data: TurnData) -> Self {
        Turn {
            session_id: session_id.into(),
            history: TurnHistory {
                kind: data.kind,
                data,
            },
        }
    }

    /// Customer turn holding both the original and the enhanced text
    pub fn human(
        session_id: impl Into<String>,
        original: impl Into<String>,
        enhanced: impl Into<String>,
    ) -> Self {
        Self::from_data(session_id, TurnData::human(original, enhanced))
    }

    /// Model turn built from the response it records
    pub fn ai(session_id: impl Into<String>, response: &ModelResponse, model_name: &str) -> Self {
        Self::from_data(session_id, TurnData::ai(response, model_name))
    }

    /// Type tag of this turn
    pub fn kind(&self) -> TurnKind {
        self.history.kind
    }

    /// Stored content
    pub fn content(&self) -> &str {
        &self.history.data.content
    }

    /// Translate into a backend message
    pub fn to_message(&self) -> Message {
        Message {
            role: self.history.kind.role(),
            content: self.history.data.prompt_text().to_string(),
        }
    }
}

/// Label of the model that generated a cached response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmString {
    pub model_name: String,
    pub name: String,
}

/// Write-only record pairing a request embedding with its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub embedding: Vec<f32>,
    pub text: Vec<TurnData>,
    pub llm_string: LlmString,
    pub return_val: Vec<TurnData>,
}

impl CacheEntry {
    /// Build an entry for one exchange
    pub fn new(
        embedding: Vec<f32>,
        original: &str,
        enhanced: &str,
        response: &ModelResponse,
        model_name: &str,
    ) -> Self {
        CacheEntry {
            embedding,
            text: vec![TurnData::human(original, enhanced)],
            llm_string: LlmString {
                model_name: model_name.to_string(),
                name: model_name.to_string(),
            },
            return_val: vec![TurnData::ai(response, model_name)],
        }
    }

    /// Generated text stored in the entry
    pub fn response_text(&self) -> Option<&str> {
        self.return_val.first().map(|d| d.content.as_str())
    }
}

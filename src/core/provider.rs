//! Model provider trait - Abstract interface for the generative backend
//!
//! The trait-based approach keeps the conversation logic independent of
//! the backend's response schema and allows scripted models in tests.

use async_trait::async_trait;

use crate::error::Result;

pub use crate::agent::types::{Message, ModelResponse, Role, TokenUsage};

/// A backend that turns an ordered list of messages into one completion
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Label recorded alongside generated turns (e.g. "Gemini 1.5 Flash")
    fn model_label(&self) -> &str;

    /// Execute one round-trip call.
    ///
    /// `messages` must be non-empty. Fails with `BackendUnavailable` when
    /// the call cannot complete and `BackendRejected` when the backend
    /// refuses it.
    async fn converse(&self, messages: &[Message]) -> Result<ModelResponse>;
}


//! Storage traits - Abstract interfaces for the conversation store
//!
//! Two logical collections back the assistant:
//! - `HistoryStore`: turns keyed by session identifier
//! - `SemanticCacheStore`: write-only log of cacheable responses
//!
//! Implementations exist for PostgreSQL (JSONB documents + pgvector) and
//! for an in-process store.

use async_trait::async_trait;

use super::types::{CacheEntry, Turn};
use crate::error::Result;

/// Conversation history persistence
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Get the backend ID
    fn id(&self) -> &str;

    /// All turns for a session in insertion order.
    ///
    /// Failures surface as `StoreReadFailed`.
    async fn find_by_session(&self, session_id: &str) -> Result<Vec<Turn>>;

    /// Append one turn. Failures surface as `StoreWriteFailed`.
    async fn insert(&self, turn: &Turn) -> Result<()>;
}

/// Semantic cache persistence. There is no lookup path.
#[async_trait]
pub trait SemanticCacheStore: Send + Sync {
    /// Get the backend ID
    fn id(&self) -> &str;

    /// Append one entry. Failures surface as `StoreWriteFailed`.
    async fn insert(&self, entry: &CacheEntry) -> Result<()>;
}

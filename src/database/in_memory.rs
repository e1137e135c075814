//! In-process conversation store

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{CacheEntry, HistoryStore, SemanticCacheStore, Turn};
use crate::error::Result;

/// Keeps turns and cache entries in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    turns: RwLock<Vec<Turn>>,
    cache: RwLock<Vec<CacheEntry>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All cache entries recorded so far
    pub async fn cache_entries(&self) -> Vec<CacheEntry> {
        self.cache.read().await.clone()
    }

    /// Number of turns across all sessions
    pub async fn turn_count(&self) -> usize {
        self.turns.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Vec<Turn>> {
        Ok(self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, turn: &Turn) -> Result<()> {
        self.turns.write().await.push(turn.clone());
        Ok(())
    }
}

#[async_trait]
impl SemanticCacheStore for InMemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn insert(&self, entry: &CacheEntry) -> Result<()> {
        self.cache.write().await.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TurnKind;

    #[tokio::test]
    async fn test_sessions_are_isolated_and_ordered() {
        let store = InMemoryStore::new();
        HistoryStore::insert(&store, &Turn::human("a", "one", "one")).await.unwrap();
        HistoryStore::insert(&store, &Turn::human("b", "other", "other")).await.unwrap();
        HistoryStore::insert(&store, &Turn::human("a", "two", "two")).await.unwrap();

        let turns = store.find_by_session("a").await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content()).collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert!(turns.iter().all(|t| t.kind() == TurnKind::Human));
        assert_eq!(store.turn_count().await, 3);
        assert!(store.find_by_session("missing").await.unwrap().is_empty());
    }
}

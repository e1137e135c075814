//! Semantic cache log backed by PostgreSQL + pgvector

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::types::Json;
use uuid::Uuid;

use super::postgres::{validate_identifier, PostgresPool};
use crate::core::{CacheEntry, SemanticCacheStore};
use crate::error::{Error, Result};

/// Write-only store for cache entries
#[derive(Clone)]
pub struct PgSemanticCache {
    pool: PostgresPool,
    insert_sql: String,
}

impl PgSemanticCache {
    /// Create a store over the given table
    pub fn new(pool: PostgresPool, table: &str) -> Result<Self> {
        validate_identifier(table)?;
        Ok(PgSemanticCache {
            pool,
            insert_sql: format!(
                "INSERT INTO {table} (id, embedding, text, llm_string, return_val) VALUES ($1, $2, $3, $4, $5)"
            ),
        })
    }
}

#[async_trait]
impl SemanticCacheStore for PgSemanticCache {
    fn id(&self) -> &str {
        "postgres"
    }

    async fn insert(&self, entry: &CacheEntry) -> Result<()> {
        sqlx::query(&self.insert_sql)
            .bind(Uuid::new_v4())
            .bind(Vector::from(entry.embedding.clone()))
            .bind(Json(&entry.text))
            .bind(Json(&entry.llm_string))
            .bind(Json(&entry.return_val))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::StoreWriteFailed(e.to_string()))?;

        Ok(())
    }
}

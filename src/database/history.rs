//! Conversation history backed by PostgreSQL

use async_trait::async_trait;
use sqlx::types::Json;
use tracing::debug;

use super::postgres::{validate_identifier, PostgresPool};
use crate::core::{HistoryStore, Turn, TurnHistory};
use crate::error::{Error, Result};

/// Turns stored as JSONB documents, one row per turn.
///
/// The serial primary key fixes store order, so replayed history always
/// follows insertion order.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PostgresPool,
    select_sql: String,
    insert_sql: String,
}

impl PgHistoryStore {
    /// Create a store over the given table
    pub fn new(pool: PostgresPool, table: &str) -> Result<Self> {
        validate_identifier(table)?;
        Ok(PgHistoryStore {
            pool,
            select_sql: select_sql(table),
            insert_sql: insert_sql(table),
        })
    }
}

fn select_sql(table: &str) -> String {
    format!("SELECT history FROM {table} WHERE session_id = $1 ORDER BY id")
}

fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (session_id, history) VALUES ($1, $2)")
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    fn id(&self) -> &str {
        "postgres"
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Vec<Turn>> {
        let rows: Vec<(Json<TurnHistory>,)> = sqlx::query_as(&self.select_sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::StoreReadFailed(e.to_string()))?;

        debug!(session_id, turns = rows.len(), "Loaded history");

        Ok(rows
            .into_iter()
            .map(|(Json(history),)| Turn {
                session_id: session_id.to_string(),
                history,
            })
            .collect())
    }

    async fn insert(&self, turn: &Turn) -> Result<()> {
        sqlx::query(&self.insert_sql)
            .bind(&turn.session_id)
            .bind(Json(&turn.history))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::StoreWriteFailed(e.to_string()))?;

        Ok(())
    }
}

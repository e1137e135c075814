//! PostgreSQL database connection and schema

use crate::config::PostgresConfig;
use crate::error::{Error, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

/// Longest identifier PostgreSQL keeps without truncation
const MAX_IDENTIFIER_LEN: usize = 63;

/// Check that a configured table name is a plain SQL identifier.
///
/// Table names are interpolated into statements, so only ASCII letters,
/// digits and underscores are accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');

    if !valid_start
        || name.len() > MAX_IDENTIFIER_LEN
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(Error::Config(format!(
            "Invalid table name {:?}: use letters, digits and underscores (max {} chars)",
            name, MAX_IDENTIFIER_LEN
        )));
    }

    Ok(())
}

/// Initialize the PostgreSQL connection pool
pub async fn init_pool(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, true).await
}

/// Initialize the PostgreSQL connection pool without pgvector check
/// Use this for running migrations before pgvector is installed
pub async fn init_pool_for_migrations(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, false).await
}

async fn init_pool_with_options(config: &PostgresConfig, require_pgvector: bool) -> Result<PostgresPool> {
    info!("Initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(config.url.expose_secret())
        .await?;

    verify_database(&pool, require_pgvector).await?;

    info!("PostgreSQL connection pool initialized successfully");
    Ok(pool)
}

/// Verify database connection and optionally check for pgvector
pub async fn verify_database(pool: &PgPool, require_pgvector: bool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    if require_pgvector {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(pool)
                .await?;

        if result.is_none() {
            return Err(Error::Database(sqlx::Error::Configuration(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".into(),
            )));
        }
    }

    Ok(())
}

/// Database migrations
pub mod migrations {
    use super::*;
    use crate::config::CollectionsConfig;
    use tracing::warn;

    /// Statements creating the history and cache tables
    pub fn statements(collections: &CollectionsConfig) -> Result<Vec<String>> {
        validate_identifier(&collections.chat_history)?;
        validate_identifier(&collections.semantic_cache)?;

        let history = &collections.chat_history;
        let cache = &collections.semantic_cache;

        Ok(vec![
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {history} (
                    id BIGSERIAL PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    history JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{history}_session_id ON {history}(session_id, id)"),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {cache} (
                    id UUID PRIMARY KEY,
                    embedding vector NOT NULL,
                    text JSONB NOT NULL,
                    llm_string JSONB NOT NULL,
                    return_val JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
        ])
    }

    /// Run all migrations
    pub async fn run(pool: &PgPool, collections: &CollectionsConfig) -> Result<()> {
        info!("Running database migrations");

        // Try to create pgvector extension (requires superuser or extension already available)
        match sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await
        {
            Ok(_) => info!("pgvector extension enabled"),
            Err(e) => {
                warn!("Could not create pgvector extension: {}. Cache table creation will fail.", e);
                warn!("Run as superuser: CREATE EXTENSION vector;");
            }
        }

        // Each statement is a separate query for SQLx
        for statement in statements(collections)? {
            sqlx::query(&statement).execute(pool).await?;
        }

        info!(
            history = %collections.chat_history,
            cache = %collections.semantic_cache,
            "Database migrations completed"
        );
        Ok(())
    }
}

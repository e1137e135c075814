//! Database module - PostgreSQL + pgvector
//!
//! Provides storage for:
//! - Conversation history: one JSONB document per turn, keyed by session
//! - Semantic cache log: request embedding (pgvector) with the exchange
//! - An in-process store with the same contract for local runs

mod history;
mod in_memory;
mod postgres;
mod semantic_cache;

pub use history::PgHistoryStore;
pub use in_memory::InMemoryStore;
pub use postgres::{
    init_pool, init_pool_for_migrations, migrations, validate_identifier, verify_database,
    PostgresPool,
};
pub use semantic_cache::PgSemanticCache;

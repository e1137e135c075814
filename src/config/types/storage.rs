//! Storage configuration types
//!
//! Configuration for the conversation store (PostgreSQL or in-memory)

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Primary storage backend
    #[serde(default)]
    pub backend: StorageBackendType,
    /// PostgreSQL configuration
    pub postgres: Option<PostgresConfig>,
    /// Table names for history and cache records
    #[serde(default)]
    pub collections: CollectionsConfig,
}

/// Storage backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendType {
    /// PostgreSQL with pgvector
    Postgres,
    /// In-memory (no persistence)
    #[default]
    Memory,
}

impl std::fmt::Display for StorageBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendType::Postgres => write!(f, "postgres"),
            StorageBackendType::Memory => write!(f, "memory"),
        }
    }
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database URL
    #[serde(skip_serializing, default = "default_secret")]
    pub url: SecretString,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    /// Create a config for the given URL with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        PostgresConfig {
            url: SecretString::from(url.into()),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

/// Names of the two logical collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionsConfig {
    /// Conversation turns, keyed by session
    #[serde(default = "default_chat_history")]
    pub chat_history: String,
    /// Write-only log of cacheable responses
    #[serde(default = "default_semantic_cache")]
    pub semantic_cache: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        CollectionsConfig {
            chat_history: default_chat_history(),
            semantic_cache: default_semantic_cache(),
        }
    }
}

fn default_chat_history() -> String {
    "chat_history".to_string()
}

fn default_semantic_cache() -> String {
    "semantic_cache".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackendType::Memory);
        assert_eq!(config.collections.chat_history, "chat_history");
        assert_eq!(config.collections.semantic_cache, "semantic_cache");
    }

    #[test]
    fn test_backend_parsing() {
        let config: StorageConfig = toml::from_str(
            r#"
            backend = "postgres"

            [postgres]
            url = "postgres://localhost/flowers"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, StorageBackendType::Postgres);
        assert_eq!(config.postgres.unwrap().max_connections, 5);
    }
}

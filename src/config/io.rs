//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use super::types::provider::GeminiConfig;
use super::types::storage::{PostgresConfig, StorageBackendType};
use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().map_or(false, |ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first. Env vars have the highest precedence:
/// defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Gemini overrides
    if let Some(api_key) = lookup("GEMINI_API_KEY") {
        let gemini = config
            .provider
            .gemini
            .get_or_insert_with(|| GeminiConfig::new(String::new()));
        gemini.api_key = SecretString::from(api_key);
    }
    if let Some(ref mut gemini) = config.provider.gemini {
        if let Some(model) = lookup("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Some(label) = lookup("GEMINI_MODEL_LABEL") {
            gemini.model_label = label;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            gemini.base_url = url;
        }
        if let Some(v) = lookup("GEMINI_TIMEOUT").and_then(|v| v.parse().ok()) {
            gemini.timeout_secs = v;
        }
    }

    // Database overrides
    if let Some(database_url) = lookup("DATABASE_URL") {
        let pg = config
            .storage
            .postgres
            .get_or_insert_with(|| PostgresConfig::new(String::new()));
        pg.url = SecretString::from(database_url);
        config.storage.backend = StorageBackendType::Postgres;
    }
    if let Some(ref mut pg) = config.storage.postgres {
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            pg.max_connections = v;
        }
        if let Some(v) = lookup("DATABASE_TIMEOUT").and_then(|v| v.parse().ok()) {
            pg.connect_timeout_secs = v;
        }
    }
    if let Some(name) = lookup("CHAT_HISTORY_COLLECTION") {
        config.storage.collections.chat_history = name;
    }
    if let Some(name) = lookup("SEMANTIC_CACHE_COLLECTION") {
        config.storage.collections.semantic_cache = name;
    }

    // Assistant overrides
    if let Some(path) = lookup("SYSTEM_PROMPT_FILE") {
        config.assistant.system_prompt_file = Some(PathBuf::from(path));
    }

    // Logging overrides
    if let Some(level) = lookup("RUST_LOG") {
        config.log.level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.log.format = format;
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

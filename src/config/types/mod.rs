//! Configuration types module

pub mod provider;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Assistant behaviour
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Provider configuration (Gemini)
    #[serde(default)]
    pub provider: provider::ProviderConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: storage::StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from defaults, config file and environment
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Assistant-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// File holding a replacement system instruction.
    /// When unset the built-in flower-shop persona is used.
    pub system_prompt_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info,reflection=debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

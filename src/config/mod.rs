//! Configuration module - Layered configuration management
//!
//! - types/mod.rs: Core configuration types (Config, AssistantConfig, LogConfig)
//! - types/provider.rs: Gemini provider configuration
//! - types/storage.rs: Storage backend configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{AssistantConfig, Config, LogConfig};

// Re-export provider types
pub use types::provider::{
    default_safety_settings, GeminiConfig, HarmBlockThreshold, HarmCategory, ProviderConfig,
    SafetySetting,
};

// Re-export storage types
pub use types::storage::{CollectionsConfig, PostgresConfig, StorageBackendType, StorageConfig};

// Re-export IO and utilities
pub use io::{
    apply_env_overrides, apply_overrides, load_config, load_config_from_path, save_config,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};

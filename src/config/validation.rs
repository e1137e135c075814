//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::storage::StorageBackendType;
use super::types::Config;
use crate::database::validate_identifier;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_provider_config(config, result);
    result = validate_storage_config(config, result);
    result = validate_assistant_config(config, result);

    result
}

fn validate_provider_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let Some(ref gemini) = config.provider.gemini else {
        return result.with_error(
            ValidationIssue::new("provider.gemini", "No Gemini provider configured")
                .with_suggestion("Set GEMINI_API_KEY environment variable or configure provider.gemini"),
        );
    };

    if gemini.api_key.expose_secret().is_empty() {
        result = result.with_error(
            ValidationIssue::new("provider.gemini.api_key", "Gemini API key is empty")
                .with_suggestion("Set GEMINI_API_KEY"),
        );
    }

    if let Err(e) = url::Url::parse(&gemini.base_url) {
        result = result.with_error(ValidationIssue::new(
            "provider.gemini.base_url",
            format!("Invalid base URL {:?}: {}", gemini.base_url, e),
        ));
    }

    if gemini.model.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "provider.gemini.model",
            "Model identifier is empty",
        ));
    }

    if gemini.timeout_secs == 0 {
        result = result.with_warning(
            ValidationIssue::new("provider.gemini.timeout_secs", "Timeout of 0 seconds disables the request deadline")
                .with_suggestion("Use a positive timeout such as 120"),
        );
    }

    result
}

fn validate_storage_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.storage.backend {
        StorageBackendType::Postgres => {
            let missing_url = config
                .storage
                .postgres
                .as_ref()
                .map_or(true, |pg| pg.url.expose_secret().is_empty());
            if missing_url {
                result = result.with_error(
                    ValidationIssue::new(
                        "storage.postgres",
                        "PostgreSQL backend selected but not configured",
                    )
                    .with_suggestion("Set DATABASE_URL environment variable or configure storage.postgres"),
                );
            }
        }
        StorageBackendType::Memory => {
            result = result.with_warning(
                ValidationIssue::new(
                    "storage.backend",
                    "In-memory storage selected; conversation history is lost on exit",
                )
                .with_suggestion("Set DATABASE_URL to persist history in PostgreSQL"),
            );
        }
    }

    let collections = &config.storage.collections;
    for (path, name) in [
        ("storage.collections.chat_history", &collections.chat_history),
        ("storage.collections.semantic_cache", &collections.semantic_cache),
    ] {
        if let Err(e) = validate_identifier(name) {
            result = result.with_error(ValidationIssue::new(path, e.to_string()));
        }
    }

    if collections.chat_history == collections.semantic_cache {
        result = result.with_error(ValidationIssue::new(
            "storage.collections",
            "History and cache collections must be distinct",
        ));
    }

    result
}

fn validate_assistant_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if let Some(ref path) = config.assistant.system_prompt_file {
        if !path.exists() {
            result = result.with_error(ValidationIssue::new(
                "assistant.system_prompt_file",
                format!("System prompt file does not exist: {}", path.display()),
            ));
        }
    }

    result
}

//! Provider configuration types
//!
//! Configuration for the Gemini generative-language backend.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Gemini configuration
    pub gemini: Option<GeminiConfig>,
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Gemini configuration, fixed at client construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Model identifier used in the request path
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Human-readable label stored alongside generated turns
    #[serde(default = "default_gemini_label")]
    pub model_label: String,
    /// Base URL
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Content-safety thresholds sent with every request
    #[serde(default = "default_safety_settings")]
    pub safety_settings: Vec<SafetySetting>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Maximum output tokens
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl GeminiConfig {
    /// Create a config with defaults and the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: SecretString::from(api_key.into()),
            model: default_gemini_model(),
            model_label: default_gemini_label(),
            base_url: default_gemini_url(),
            timeout_secs: default_timeout(),
            safety_settings: default_safety_settings(),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_label() -> String {
    "Gemini 1.5 Flash".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// All four harm categories with blocking disabled
pub fn default_safety_settings() -> Vec<SafetySetting> {
    HarmCategory::ALL
        .iter()
        .map(|category| SafetySetting {
            category: *category,
            threshold: HarmBlockThreshold::BlockNone,
        })
        .collect()
}

/// Harm category a safety threshold applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    /// Every category the backend filters on
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

/// Blocking threshold for a harm category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// One category/threshold pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_safety_settings_disable_blocking() {
        let settings = default_safety_settings();
        assert_eq!(settings.len(), 4);
        assert!(settings
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockNone));
    }

    #[test]
    fn test_safety_setting_wire_names() {
        let json = serde_json::to_value(SafetySetting {
            category: HarmCategory::HateSpeech,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(json["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_gemini_config_defaults_from_empty_table() {
        let config: GeminiConfig = toml::from_str("").unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.model_label, "Gemini 1.5 Flash");
        assert_eq!(config.safety_settings.len(), 4);
        assert!(config.temperature.is_none());
    }
}

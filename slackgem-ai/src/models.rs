use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Configuration for an AI provider
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The type of provider (currently only "gemini")
    pub provider_type: String,

    /// Base URL for API requests
    pub api_base: Option<String>,

    /// API key for authentication
    pub api_key: String,

    /// Default model to use with this provider
    pub default_model: String,

    /// Additional provider-specific configuration options
    pub options: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            provider_type: "gemini".to_string(),
            api_base: None,
            api_key: api_key.into(),
            default_model: default_model.into(),
            options: HashMap::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        self.api_base = api_base;
        self
    }
}

// The key never goes to the logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_type", &self.provider_type)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .field("options", &self.options)
            .finish()
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::GenerationError;
use crate::models::ProviderConfig;
use crate::traits::TextGenerator;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider implementation
pub struct GeminiProvider {
    config: ProviderConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::new();
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        let api_base = self.config.api_base.clone().unwrap_or_else(|| {
            GEMINI_API_BASE.to_string()
        });
        format!(
            "{}/models/{}:generateContent",
            api_base.trim_end_matches('/'),
            self.config.default_model
        )
    }

    /// Builds the `generateContent` body for a single-turn prompt.
    pub fn build_request(&self, prompt: &str) -> Value {
        let mut request = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.config.options.get("temperature")
            .and_then(|t| t.parse::<f64>().ok())
        {
            generation_config.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = self.config.options.get("max_output_tokens")
            .and_then(|t| t.parse::<u32>().ok())
        {
            generation_config.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if !generation_config.is_empty() {
            request["generationConfig"] = Value::Object(generation_config);
        }

        request
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint();
        let request_payload = self.build_request(prompt);

        tracing::info!("Making API call to {}", url);
        tracing::debug!("Gemini request payload: {}", request_payload);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_payload)
            .send()
            .await?;

        let status = response.status();
        // Get the raw response text first for better error handling
        let response_text = response.text().await?;
        tracing::debug!("Raw API response: {}", response_text);

        let data = serde_json::from_str::<Value>(&response_text).map_err(|e| {
            tracing::error!("Failed to parse API response as JSON: {:?}", e);
            if status.is_success() {
                GenerationError::Json(e)
            } else {
                GenerationError::Api {
                    status: status.as_u16(),
                    message: response_text.clone(),
                }
            }
        })?;

        if !status.is_success() || data.get("error").is_some() {
            let message = data.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            tracing::error!("API returned error: {}", message);
            return Err(GenerationError::Api { status: status.as_u16(), message });
        }

        extract_text(&data)
    }
}

/// Pulls the generated text out of a `generateContent` response body.
///
/// The parts of the first candidate are concatenated. A prompt rejected by
/// safety filtering reports `promptFeedback.blockReason` and carries no
/// candidates.
pub fn extract_text(data: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = data.pointer("/promptFeedback/blockReason").and_then(|r| r.as_str()) {
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let candidate = data.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| GenerationError::InvalidResponse("no candidates returned".into()))?;

    let parts = candidate.pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let finish = candidate.get("finishReason")
                .and_then(|f| f.as_str())
                .unwrap_or("unknown");
            GenerationError::InvalidResponse(format!("candidate has no content (finish reason: {})", finish))
        })?;

    let text: String = parts.iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(GenerationError::InvalidResponse("candidate has no text parts".into()));
    }

    Ok(text)
}

/// Create a text generator for the configured provider type.
pub fn create_provider(config: ProviderConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match config.provider_type.to_lowercase().as_str() {
        "gemini" | "google" => Ok(Arc::new(GeminiProvider::new(config))),
        other => Err(GenerationError::UnsupportedProvider(other.to_string())),
    }
}

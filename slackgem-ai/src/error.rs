use thiserror::Error;

/// Failure of a single prompt-in, text-out generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Unsupported provider type: {0}")]
    UnsupportedProvider(String),
}

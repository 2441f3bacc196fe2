use thiserror::Error;
use toolhouse_client::ToolhouseError;

/// Chat completion failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Groq request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Groq returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode Groq response: {0}")]
    Decode(String),

    #[error("Groq response contained no choices")]
    EmptyResponse,
}

/// Failures while running a tool through the model.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Toolhouse(#[from] ToolhouseError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolhouseError {
    #[error("Toolhouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Toolhouse returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode Toolhouse response: {0}")]
    Decode(String),

    #[error("Invalid tool definition: {0}")]
    InvalidTool(String),
}

pub type Result<T> = std::result::Result<T, ToolhouseError>;

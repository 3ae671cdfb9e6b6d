//! Error types for Deskbot.

use thiserror::Error;

/// Library-level error type for Deskbot operations.
#[derive(Error, Debug)]
pub enum DeskbotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Helpdesk returned status {status} for {url}")]
    Helpdesk { status: u16, url: String },

    #[error("Helpdesk authentication failed. Please check your Freshdesk API key.")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Helpdesk rate limit reached (retry after {}s)", retry_after.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()))]
    RateLimited { retry_after: Option<u64> },

    #[error("Knowledge base refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Interaction log error: {0}")]
    InteractionLog(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Deskbot operations.
pub type Result<T> = std::result::Result<T, DeskbotError>;

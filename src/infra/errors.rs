// src/infra/errors.rs — Error types for Storymill

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorymillError {
    // Generation API errors
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
    },

    #[error("Provider returned an unusable response: {0}")]
    ProviderResponse(String),

    // Document database errors
    #[error("Document '{id}' not found in '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    // User errors
    #[error("No provider API key configured. Set STORYMILL_OPENAI_KEY or add it to config.toml.")]
    NoApiKey,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorymillError {
    /// Whether a retry at the HTTP layer could plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            StorymillError::Provider { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            StorymillError::Http(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorymillError>;

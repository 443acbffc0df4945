// src/infra/errors.rs — Error types for the notebook pipeline

use thiserror::Error;

use crate::core::template::TemplateError;

#[derive(Error, Debug)]
pub enum NotebookError {
    // Template errors (never retried)
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // Collaborator errors (GitHub, notes file, reference links)
    #[error("Fetch from {collaborator} failed: {message}")]
    Fetch {
        collaborator: String,
        message: String,
    },

    // Completion backend errors
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Completion timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // User errors
    #[error("No API key configured. Set OPENAI_API_KEY.")]
    NoProvider,

    #[error("Collection '{name}' not found")]
    CollectionNotFound { name: String },

    #[error("Collection '{name}' already exists")]
    CollectionExists { name: String },

    // Infra
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NotebookError {
    pub fn fetch(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        NotebookError::Fetch {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// Whether an outer policy could reasonably retry. The pipeline itself
    /// never does.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            NotebookError::Provider {
                retriable: true,
                ..
            } | NotebookError::RateLimited { .. }
                | NotebookError::Timeout { .. }
        )
    }
}

//! Error types for the postsmith generation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors (cache records and the post store)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Post already exists: [{category}] {title}")]
    DuplicateKey { title: String, category: String },

    #[error("Cache record at {key} belongs to a different item ({found})")]
    KeyMismatch { key: String, found: String },

    #[error("Unsupported cache record schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Pipeline-level errors: provider failures, configuration faults, storage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Provider request timed out after {0:?}")]
    ProviderTimeout(std::time::Duration),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Generation unavailable after {attempts} attempt(s): {last_error}")]
    GenerationUnavailable { attempts: usize, last_error: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("No Markdown source documents found in {0}")]
    NoSourceDocuments(PathBuf),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl PipelineError {
    /// Conditions that abort a whole run before any item is processed.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::ConfigError(_)
                | PipelineError::SourceNotFound(_)
                | PipelineError::NoSourceDocuments(_)
        )
    }

    /// Whether a transport retry can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::ConfigError(_) => false,
            PipelineError::ProviderAuthFailed(_) => false,
            PipelineError::ProviderModelNotFound(_) => false,
            PipelineError::GenerationUnavailable { .. } => false,
            PipelineError::ProviderRateLimit(_) => true,
            PipelineError::ProviderRequestFailed(_) => true,
            PipelineError::ProviderError(_) => true,
            _ => true,
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::ConfigError(err.to_string())
    }
}

//! Client error types.

use thiserror::Error;

use graphbatch_core::{BatchError, TracingError};
use graphbatch_providers::ProviderError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// No access token could be obtained.
    #[error("authentication failed: {0}")]
    Authentication(#[source] ProviderError),

    /// Any other provider failure.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Requests could not be grouped into batches.
    #[error("batching error: {0}")]
    Batch(#[from] BatchError),

    /// Logging could not be set up.
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

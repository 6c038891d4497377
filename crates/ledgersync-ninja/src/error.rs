//! Error types for the Invoice Ninja client.

use thiserror::Error;

/// Errors from the source-system API.
#[derive(Debug, Error)]
pub enum NinjaError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("Invoice Ninja API error: HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind name.
        entity: &'static str,
        /// Source id.
        id: String,
    },
}

/// Result type for source-system operations.
pub type NinjaResult<T> = Result<T, NinjaError>;

//! Error types for the HTTP client.

use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the server.
        message: String,
    },

    /// The server reported a generation failure in the stream.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Stream closed before a `done` payload.
    #[error("Stream ended unexpectedly")]
    StreamEnded,
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

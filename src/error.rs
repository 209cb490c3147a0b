//! Error types for the table context pipeline.
//!
//! This module defines all error types that can occur while segmenting pages,
//! rendering tables and talking to the embedding and generation services.

use std::path::PathBuf;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A per-page detection or structure artifact does not exist
    #[error("Missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Zero-area page or box, or an unusable resolution
    #[error("Degenerate geometry on page {page}: {reason}")]
    DegenerateGeometry {
        /// Zero-based page index
        page: usize,
        /// What was degenerate
        reason: String,
    },

    /// Structured table markup could not be turned into a table
    #[error("Table markup error: {0}")]
    TableMarkup(String),

    /// HTTP transport error (connect, timeout, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// External service answered with a failure
    #[error("{service} service failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Service {
        /// Service name ("embedding" or "generation")
        service: &'static str,
        /// HTTP status, if the failure came with one
        status: Option<u16>,
        /// Response body or reason
        message: String,
    },

    /// Embedding service broke its order, count or dimension contract
    #[error("Embedding contract violation: {0}")]
    Embedding(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a retry of the same request may succeed.
    ///
    /// Timeouts, connection failures, 408, 429 and 5xx responses are transient;
    /// everything else fails the same way on every attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Service {
                status: Some(status),
                ..
            } => matches!(*status, 408 | 429) || (500..600).contains(status),
            _ => false,
        }
    }

    /// Build a service failure without an HTTP status.
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Error::Service {
            service,
            status: None,
            message: message.into(),
        }
    }
}

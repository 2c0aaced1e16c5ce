//! Error types for the Billingo API client.
//!
//! # Design
//! The request client classifies every failure into exactly one variant.
//! 401/403/404/429 get dedicated variants because the CLI reports each of
//! them differently; every other non-2xx status lands in `Api` with the
//! status code and the server's message. The resource facade never catches
//! or rewrites these.

use thiserror::Error;

/// Errors returned by `RequestClient` and everything built on top of it.
#[derive(Debug, Error)]
pub enum BillingoError {
    /// No API key is available. Raised before any network I/O.
    #[error("{0}")]
    Configuration(String),

    /// The server returned 401.
    #[error("Authentication failed. Check your API key.")]
    Authentication,

    /// The server returned 403.
    #[error("Access forbidden. Check your API permissions.")]
    Authorization,

    /// The server returned 404.
    #[error("Resource not found.")]
    NotFound,

    /// The server returned 429.
    #[error("Rate limit exceeded. Please wait before retrying.")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request went out but no response came back.
    #[error("No response from Billingo API. Check your internet connection. ({0})")]
    Network(String),

    /// A 2xx response whose body could not be decoded as JSON.
    #[error("Invalid response from Billingo API: {0}")]
    InvalidResponse(String),

    /// Neither a server response nor a network failure.
    #[error("{0}")]
    Unknown(String),
}

impl BillingoError {
    pub(crate) fn missing_api_key() -> Self {
        BillingoError::Configuration(
            "API key not configured. Please run: billingo config set --api-key <key>".to_string(),
        )
    }
}

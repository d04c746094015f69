//! Error types for X API access.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the client, paginator and query operations.
#[derive(Debug, Error)]
pub enum XError {
    /// No bearer token could be resolved
    #[error("X_BEARER_TOKEN not found (searched: {searched})")]
    CredentialMissing { searched: String },

    /// Provider answered 429; the caller decides whether to wait
    #[error("Rate limited, resets in {wait_secs}s")]
    RateLimited { wait_secs: u64 },

    /// Any other non-success status
    #[error("X API {status}: {body}")]
    Api { status: u16, body: String },

    /// Username lookup returned no data
    #[error("User @{0} not found")]
    UserNotFound(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache directory I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XError {
    /// Whether this is a rate-limit signal.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Suggested wait before retrying, if the provider gave one.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { wait_secs } => Some(Duration::from_secs(*wait_secs)),
            _ => None,
        }
    }
}

/// Result type for X API operations.
pub type XResult<T> = Result<T, XError>;

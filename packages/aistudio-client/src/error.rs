//! Typed errors for the AI Studio client.
//!
//! Uses `thiserror` so callers can match on the failure kind: a run that the
//! remote service rejected is handled very differently from a local timeout.

use std::time::Duration;

use thiserror::Error;

use crate::family::Family;

/// Errors raised while submitting, polling or fetching a run.
#[derive(Debug, Error)]
pub enum AiStudioError {
    /// Remote accepted the request but returned no usable run identifier
    #[error("No run ID returned from {family} request")]
    Submission { family: Family },

    /// Empty handle, or a handle used against the wrong family
    #[error("invalid run handle: {reason}")]
    InvalidHandle { reason: String },

    /// Remote reported a terminal failure state
    #[error("{} failed: {message}", .family.activity())]
    RemoteRunFailure { family: Family, message: String },

    /// Local time budget ran out before the run reached a terminal state
    #[error("{} timeout after {}ms", .family.activity(), .timeout.as_millis())]
    PollTimeout { family: Family, timeout: Duration },

    /// Network or HTTP-level failure, passed through untouched
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Item parameters could not be resolved into a request
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing API key, malformed base URL
    #[error("configuration error: {0}")]
    Config(String),
}

impl AiStudioError {
    /// True when the remote service itself declared the run failed.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteRunFailure { .. })
    }

    /// True when the local poll budget was exhausted.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::PollTimeout { .. })
    }
}

/// Errors from the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed, request timed out
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not valid JSON
    #[error("parse error: {0}")]
    Parse(String),
}

/// A batch aborted on its first failing item.
#[derive(Debug, Error)]
#[error("item {item_index}: {source}")]
pub struct BatchError {
    pub item_index: usize,
    #[source]
    pub source: AiStudioError,
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AiStudioError>;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

//! # Error Types
//!
//! Errors raised by transport collaborators (HTTP clients, test doubles).

use thiserror::Error;

/// Transient failure reported by the transport layer.
///
/// Propagated verbatim through the integrity core; callers may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure (DNS, TLS, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body could not be decoded into the expected DTO.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The caller's deadline elapsed before the response arrived.
    #[error("Request timed out")]
    Timeout,
}

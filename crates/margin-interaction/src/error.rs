//! Failures of a single remote assistant call.

use thiserror::Error;

/// Why a remote assistant call produced no reply.
///
/// None of these escape the dispatcher; each one is turned into an assistant
/// message for the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteCallError {
    /// Endpoint or credential missing. Path selection normally prevents this.
    #[error("Remote agent is not configured: missing {0}")]
    MissingConfiguration(&'static str),

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout, bad URL).
    #[error("Network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx status.
    #[error("API request failed: {status} - {status_text}. Details: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("Failed to parse agent response: {0}")]
    InvalidBody(String),
}

impl RemoteCallError {
    /// Connectivity problems get the troubleshooting checklist instead of the raw text.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

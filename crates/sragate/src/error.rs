//! Error types for the gateway

use thiserror::Error;

/// Errors that can occur while serving a search, read or recommend call
///
/// Only [`GatewayError::InvalidSource`] and [`GatewayError::InvalidArgument`]
/// leave the public operations. Every other variant is recovered locally and
/// turned into an empty result set, a synthetic error record or an error string.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// URL is outside the documentation site and the code host
    #[error("Invalid URL: {0}. URL must be from the documentation site or GitHub")]
    InvalidSource(String),

    /// Tool argument out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    Connect(#[source] reqwest::Error),

    /// Sending the request or reading its body failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Request could not be built or its redirects could not be followed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Backend answered with a non-success status
    #[error("{url} - status code {status}")]
    UpstreamStatus { url: String, status: u16 },

    /// Backend body could not be decoded
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    /// Transport kept failing until the retry budget ran out
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last_error: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::Connect(err)
        } else if err.is_decode() {
            GatewayError::InvalidPayload(err.to_string())
        } else if err.is_request() || err.is_body() {
            GatewayError::Request(err.to_string())
        } else {
            GatewayError::Http(err.to_string())
        }
    }

    /// True for connection-level failures worth retrying.
    ///
    /// HTTP status errors are never transient: the server answered.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout | GatewayError::Connect(_) | GatewayError::Request(_)
        )
    }

    /// True for errors that must reach the caller instead of degrading.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidSource(_) | GatewayError::InvalidArgument(_)
        )
    }
}

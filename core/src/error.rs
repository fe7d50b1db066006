use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced while dispatching a prepared WebDAV request.
///
/// Preparing a request never fails; every variant here originates in a
/// transport or in client configuration.
#[derive(Error, Debug)]
pub enum DavError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Request failed (status {status}): {body}")]
    StatusError { status: StatusCode, body: String },
    #[error("Response body exceeded the maximum content length of {limit} bytes")]
    ContentLengthExceeded { limit: u64 },
    #[error("Request body of {length} bytes exceeded the maximum body length of {limit} bytes")]
    BodyLengthExceeded { limit: u64, length: u64 },
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl DavError {
    /// Status code carried by a rejected response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DavError::StatusError { status, .. } => Some(*status),
            DavError::NetworkError(e) => e.status(),
            _ => None,
        }
    }
}

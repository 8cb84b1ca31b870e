//! Errors for the relay-facing HTTP clients.

use atrium_core::AtriumError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The relay could not be reached or the body could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The relay answered with a non-success status.
    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    /// The relay sent an error frame mid-stream.
    #[error("{0}")]
    Relay(String),

    /// A success response had an unexpected body.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Status-code error with the `{detail}` message from the body, if any.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<DetailBody>(body)
            .map(|b| b.detail)
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        TransportError::Status {
            status: status.as_u16(),
            detail,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401 responses.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<TransportError> for AtriumError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Relay(message) => AtriumError::transport(message),
            TransportError::Status { status, detail } if status < 500 => {
                AtriumError::validation(detail)
            }
            other => AtriumError::transport(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct DetailBody {
    detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_reads_detail() {
        let err = TransportError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Unknown persona"}"#);
        assert_eq!(
            err,
            TransportError::Status {
                status: 404,
                detail: "Unknown persona".to_string()
            }
        );
    }

    #[test]
    fn test_from_status_without_body() {
        let err = TransportError::from_status(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.to_string(), "Bad Gateway (HTTP 502)");
        assert!(AtriumError::from(err).is_transport());
    }

    #[test]
    fn test_client_errors_map_to_validation() {
        let err = TransportError::from_status(StatusCode::BAD_REQUEST, r#"{"detail":"Message is empty"}"#);
        assert!(AtriumError::from(err).is_validation());
    }
}

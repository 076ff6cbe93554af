//! Error types for the gateway client

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur when talking to the voice/SMS gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (network-level; the gateway may be unreachable)
    #[error("gateway request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Gateway rejected the destination number
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// Gateway returned an error status code
    #[error("gateway error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the gateway
        message: String,
    },

    /// Failed to parse the gateway response
    #[error("failed to parse gateway response: {0}")]
    ParseError(String),
}

impl GatewayError {
    /// Create an API error from status code and message, mapping the
    /// gateway's bad-request responses onto the destination rejection.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 400 {
            Self::InvalidDestination(message)
        } else {
            Self::ApiError { status, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_maps_to_invalid_destination() {
        match GatewayError::from_status(400, "destination not allowed") {
            GatewayError::InvalidDestination(msg) => {
                assert_eq!(msg, "destination not allowed")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_statuses_stay_api_errors() {
        match GatewayError::from_status(503, "maintenance") {
            GatewayError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! Error types for the relay

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chatrelay_contracts::ErrorBody;
use thiserror::Error;

/// Relay error types
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("No messages provided")]
    EmptyConversation,

    #[error("Last message must be from the user")]
    LastTurnNotUser,

    #[error("Message content must not be empty")]
    EmptyQuery,

    #[error("Upstream API key is not configured")]
    MissingApiKey,

    #[error("Upstream request failed ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Failed to reach upstream: {0}")]
    Unreachable(String),

    #[error("Upstream stream error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_)
            | Self::EmptyConversation
            | Self::LastTurnNotUser
            | Self::EmptyQuery => StatusCode::BAD_REQUEST,
            Self::UpstreamRejected { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::MissingApiKey | Self::Unreachable(_) | Self::Transport(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured body returned on the non-streaming path.
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::InvalidBody(details) => {
                ErrorBody::new("Invalid request body").with_details(details.clone())
            }
            Self::UpstreamRejected { message, .. } => {
                ErrorBody::new("Upstream request failed").with_details(message.clone())
            }
            Self::Unreachable(details) => {
                ErrorBody::new("Failed to reach upstream").with_details(details.clone())
            }
            Self::Transport(details) => {
                ErrorBody::new("Upstream stream error").with_details(details.clone())
            }
            Self::Internal(details) => {
                ErrorBody::new("Internal server error").with_details(details.clone())
            }
            other => ErrorBody::new(other.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape_errors_are_bad_request() {
        assert_eq!(RelayError::EmptyConversation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::LastTurnNotUser.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::LastTurnNotUser.body(),
            ErrorBody::new("Last message must be from the user")
        );
    }

    #[test]
    fn test_upstream_status_is_mirrored() {
        let err = RelayError::UpstreamRejected {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.body().details.as_deref(), Some("invalid api key"));
    }

    #[test]
    fn test_non_error_upstream_status_falls_back_to_500() {
        for status in [0, 200, 302, 1000] {
            let err = RelayError::UpstreamRejected {
                status,
                message: String::new(),
            };
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_missing_api_key_is_server_error() {
        let err = RelayError::MissingApiKey;
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().error, "Upstream API key is not configured");
    }
}

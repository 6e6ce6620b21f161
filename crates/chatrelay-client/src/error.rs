//! Error types for the relay client

use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Relay rejected the request ({status}): {error}{}", details_suffix(.details))]
    Rejected {
        status: u16,
        error: String,
        details: Option<String>,
    },

    #[error("Upstream error: {0}")]
    Turn(String),

    #[error("Stream error: {0}")]
    Transport(String),

    #[error("Turn cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
}

fn details_suffix(details: &Option<String>) -> String {
    match details {
        Some(details) if !details.is_empty() => format!(" ({})", details),
        _ => String::new(),
    }
}

impl ClientError {
    /// True when retrying will not help until something is reconfigured:
    /// credentials, upstream URL or the relay's own settings.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Rejected { status, error, .. } => {
                matches!(status, 401 | 403 | 404)
                    || (*status == 500 && error.to_lowercase().contains("not configured"))
            }
            _ => false,
        }
    }

    /// True for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            Self::Transport(_) => true,
            Self::Request(err) => err.is_connect() || err.is_timeout(),
            Self::Turn(_) | Self::Cancelled => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

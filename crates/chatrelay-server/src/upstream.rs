//! HTTP client for the upstream chat provider

use std::fmt::Display;
use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};

const MAX_ERROR_BODY: usize = 512;
// Enough to find a JSON `message` in a typical error document.
const MAX_ERROR_READ: usize = 8 * 1024;

/// Opens one streaming request per chat turn.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `query` upstream and returns the response once a success status
    /// has been received. The body has not been read yet.
    pub async fn open(&self, query: &str, user: &str) -> Result<Response> {
        let api_key = self.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;

        let body = json!({
            "inputs": {},
            "query": query,
            "response_mode": "streaming",
            "user": user,
        });

        let response = self
            .http
            .post(format!("{}/chat-messages", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "upstream request failed");
                RelayError::Unreachable(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        debug!(status = response.status().as_u16(), "upstream stream opened");
        Ok(response)
    }
}

/// Converts a non-success upstream response into a rejection error,
/// preferring the provider's own `message` when the body is JSON.
pub async fn response_to_error(response: Response) -> RelayError {
    let status = response.status().as_u16();
    let body = read_capped(response.bytes_stream(), MAX_ERROR_READ).await;
    let message = error_message_from_body(&body);

    warn!(status, message = %message, "upstream rejected the request");
    RelayError::UpstreamRejected { status, message }
}

/// Reads at most `limit` bytes, stopping early on a read error.
async fn read_capped<S, B, E>(body: S, limit: usize) -> String
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut buf = Vec::new();
    while buf.len() < limit {
        match body.next().await {
            Some(Ok(bytes)) => {
                let bytes = bytes.as_ref();
                let take = bytes.len().min(limit - buf.len());
                buf.extend_from_slice(&bytes[..take]);
            }
            Some(Err(err)) => {
                debug!(error = %err, "failed to read upstream error body");
                break;
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn error_message_from_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(message) = value.get("message").and_then(Value::as_str)
    {
        return truncate(message);
    }
    truncate(body.trim())
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &text[..end])
}

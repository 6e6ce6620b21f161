//! Upstream event decoding

use serde::Deserialize;

const DEFAULT_FAILURE_MESSAGE: &str = "Upstream reported an error";

/// One decoded upstream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Content-bearing update. Whether `text` is cumulative or a delta is
    /// left for the consumer to decide.
    Token { text: String },
    /// Turn completion, optionally with final content.
    End { text: Option<String> },
    /// File or attachment notice.
    Attachment,
    /// Error signaled by upstream.
    Failure { message: String },
}

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum RawEvent {
    Message {
        #[serde(default)]
        answer: Option<String>,
    },
    AgentMessage {
        #[serde(default)]
        answer: Option<String>,
    },
    MessageEnd {
        #[serde(default)]
        answer: Option<String>,
    },
    MessageFile {},
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Decodes a `data:` payload.
///
/// Returns `Ok(None)` for well-formed events of kinds the relay does not
/// care about (pings, workflow progress and the like).
pub fn decode_event(payload: &str) -> Result<Option<UpstreamEvent>, serde_json::Error> {
    let raw: RawEvent = serde_json::from_str(payload)?;
    let event = match raw {
        RawEvent::Message { answer } | RawEvent::AgentMessage { answer } => {
            UpstreamEvent::Token {
                text: answer.unwrap_or_default(),
            }
        }
        RawEvent::MessageEnd { answer } => UpstreamEvent::End { text: answer },
        RawEvent::MessageFile {} => UpstreamEvent::Attachment,
        RawEvent::Error { message } => UpstreamEvent::Failure {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        },
        RawEvent::Other => return Ok(None),
    };
    Ok(Some(event))
}

//! HTTP client for the relay and the per-turn reader loop.

use std::fmt::Display;

use chatrelay_contracts::{ChatRequest, ErrorBody, Frame, LineBuffer, NormalizedChunk, parse_frame};
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use tracing::debug;

use crate::cancel::{TurnCancelHandle, TurnCancelReceiver};
use crate::error::{ClientError, Result};
use crate::message::Message;
use crate::reconciler::{Applied, Reconciler};

const CHAT_PATH: &str = "/api/chat-messages";

/// Sends chat turns to a relay server.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Runs one turn to completion.
    ///
    /// `on_progress` is called with the reconciled text after every content
    /// update. Returns `Ok(None)` when the turn finished without any text.
    pub async fn send_turn<F>(
        &self,
        request: &ChatRequest,
        mut cancel: TurnCancelReceiver,
        on_progress: F,
    ) -> Result<Option<Message>>
    where
        F: FnMut(&str),
    {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("turn cancelled before the relay responded");
                return Err(ClientError::Cancelled);
            }
            response = self.open(request) => response?,
        };

        reconcile_stream(response.bytes_stream(), &mut cancel, on_progress).await
    }

    /// Runs one turn without progress reporting or cancellation.
    pub async fn collect(&self, request: &ChatRequest) -> Result<Option<Message>> {
        let (_handle, receiver) = TurnCancelHandle::new();
        self.send_turn(request, receiver, |_| {}).await
    }

    async fn open(&self, request: &ChatRequest) -> Result<Response> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, CHAT_PATH))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response)
    }
}

async fn rejection(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Rejected {
            status,
            error: body.error,
            details: body.details,
        },
        Err(_) => {
            let text = text.trim();
            ClientError::Rejected {
                status,
                error: if text.is_empty() {
                    "Relay request failed".to_string()
                } else {
                    text.to_string()
                },
                details: None,
            }
        }
    }
}

/// Reads a normalized chunk stream and reconciles it into one message.
///
/// Chunks are applied strictly in arrival order. The stream is dropped as
/// soon as the turn reaches a terminal state.
pub async fn reconcile_stream<S, B, E, F>(
    stream: S,
    cancel: &mut TurnCancelReceiver,
    mut on_progress: F,
) -> Result<Option<Message>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer = LineBuffer::new();
    let mut reconciler = Reconciler::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                reconciler.cancel();
                debug!("turn cancelled, discarding partial response");
                return Err(ClientError::Cancelled);
            }
            next = stream.next() => next,
        };

        let (lines, exhausted) = match next {
            Some(Ok(bytes)) => (buffer.push(bytes.as_ref()), false),
            Some(Err(err)) => {
                reconciler.fail();
                return Err(ClientError::Transport(err.to_string()));
            }
            None => (buffer.finish().into_iter().collect::<Vec<_>>(), true),
        };

        for line in lines {
            let chunk = match parse_frame(&line) {
                None => continue,
                Some(Frame::Done) => return Ok(reconciler.finish()),
                Some(Frame::Data(payload)) => match serde_json::from_str::<NormalizedChunk>(payload) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        debug!(error = %err, "skipping undecodable chunk");
                        continue;
                    }
                },
            };

            match reconciler.apply(chunk) {
                Applied::Updated => on_progress(reconciler.text()),
                Applied::Finalized(message) => return Ok(message),
                Applied::Failed(error) => return Err(ClientError::Turn(error)),
                Applied::Ignored => {}
            }
        }

        if exhausted {
            return Ok(reconciler.finish());
        }
    }
}

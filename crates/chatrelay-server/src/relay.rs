//! Upstream event stream to normalized chunk stream.
//!
//! The relay reads newline-framed upstream records, decodes the `data:`
//! payloads and re-emits them as [`NormalizedChunk`]s. The first terminal
//! signal (end, failure or the literal `[DONE]` marker) ends the output and
//! the upstream stream is dropped without being read further.

use std::fmt::Display;

use async_stream::stream;
use chatrelay_contracts::{Frame, LineBuffer, NormalizedChunk, parse_frame};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::event::{UpstreamEvent, decode_event};

/// What to do with one upstream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write the chunk and keep reading.
    Emit(NormalizedChunk),
    /// Write the chunk, if any, then close.
    Close(Option<NormalizedChunk>),
    /// Nothing to write.
    Skip,
}

/// Maps a decoded upstream event onto the normalized protocol.
pub fn classify(event: UpstreamEvent) -> Step {
    match event {
        UpstreamEvent::Token { text } if text.is_empty() => Step::Skip,
        UpstreamEvent::Token { text } => Step::Emit(NormalizedChunk::content(text)),
        UpstreamEvent::End { text: Some(text) } if !text.is_empty() => {
            Step::Close(Some(NormalizedChunk::final_content(text)))
        }
        UpstreamEvent::End { .. } => Step::Close(Some(NormalizedChunk::done())),
        UpstreamEvent::Attachment => Step::Skip,
        UpstreamEvent::Failure { message } => Step::Close(Some(NormalizedChunk::error(message))),
    }
}

/// Classifies one raw line. Undecodable payloads are skipped.
pub fn step_for_line(line: &str) -> Step {
    match parse_frame(line) {
        None => Step::Skip,
        Some(Frame::Done) => Step::Close(None),
        Some(Frame::Data(payload)) => match decode_event(payload) {
            Ok(Some(event)) => classify(event),
            Ok(None) => Step::Skip,
            Err(err) => {
                debug!(error = %err, "skipping undecodable upstream frame");
                Step::Skip
            }
        },
    }
}

/// Relays an upstream byte stream.
///
/// A transport error from `upstream` is yielded once as
/// [`RelayError::Transport`] and ends the stream. If upstream closes without
/// any terminal signal the output simply ends.
pub fn relay_stream<S, B, E>(upstream: S) -> impl Stream<Item = Result<NormalizedChunk, RelayError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    stream! {
        let mut upstream = Box::pin(upstream);
        let mut buffer = LineBuffer::new();
        let mut turn = TurnLog::default();

        loop {
            let (lines, exhausted) = match upstream.next().await {
                Some(Ok(bytes)) => (buffer.push(bytes.as_ref()), false),
                Some(Err(err)) => {
                    warn!(error = %err, chunks = turn.chunks, "upstream transport failed mid-stream");
                    turn.close("transport_error");
                    yield Err(RelayError::Transport(err.to_string()));
                    return;
                }
                None => (buffer.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in lines {
                match step_for_line(&line) {
                    Step::Skip => {}
                    Step::Emit(chunk) => {
                        turn.chunks += 1;
                        yield Ok(chunk);
                    }
                    Step::Close(last) => {
                        let reason = match &last {
                            None => "done_marker",
                            Some(chunk) if chunk.error.is_some() => "upstream_error",
                            Some(_) => "message_end",
                        };
                        if let Some(chunk) = last {
                            turn.chunks += 1;
                            yield Ok(chunk);
                        }
                        turn.close(reason);
                        return;
                    }
                }
            }

            if exhausted {
                turn.close("upstream_closed");
                return;
            }
        }
    }
}

/// Per-turn bookkeeping for logs. Dropping it before `close` means the
/// downstream side went away mid-turn.
#[derive(Default)]
struct TurnLog {
    chunks: usize,
    closed: bool,
}

impl TurnLog {
    fn close(&mut self, reason: &str) {
        self.closed = true;
        info!(chunks = self.chunks, reason, "relay stream closed");
    }
}

impl Drop for TurnLog {
    fn drop(&mut self) {
        if !self.closed {
            debug!(
                chunks = self.chunks,
                "downstream disconnected, releasing upstream connection"
            );
        }
    }
}

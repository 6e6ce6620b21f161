//! Per-turn reconciliation of normalized chunks into one message.
//!
//! A turn starts `Active` and ends in exactly one of `Finalized`, `Failed`
//! or `Cancelled`. Every terminal transition goes through this type, so the
//! finalized message can only be produced once no matter how many
//! completion signals arrive.

use chatrelay_contracts::NormalizedChunk;

use crate::merge::merge_content;
use crate::message::Message;

/// Observable turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Active,
    Finalized,
    Failed,
    Cancelled,
}

/// Result of applying one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The accumulated text changed; read it with [`Reconciler::text`].
    Updated,
    /// The turn completed. `None` when there was no text to deliver.
    Finalized(Option<Message>),
    /// Upstream reported an error; accumulated text was discarded.
    Failed(String),
    /// Nothing happened: the chunk carried no content or the turn was
    /// already over.
    Ignored,
}

#[derive(Debug)]
enum Inner {
    Active { text: String },
    Finalized,
    Failed,
    Cancelled,
}

#[derive(Debug)]
pub struct Reconciler {
    inner: Inner,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            inner: Inner::Active {
                text: String::new(),
            },
        }
    }

    pub fn state(&self) -> TurnState {
        match self.inner {
            Inner::Active { .. } => TurnState::Active,
            Inner::Finalized => TurnState::Finalized,
            Inner::Failed => TurnState::Failed,
            Inner::Cancelled => TurnState::Cancelled,
        }
    }

    /// Text accumulated so far. Empty once the turn is over.
    pub fn text(&self) -> &str {
        match &self.inner {
            Inner::Active { text } => text,
            _ => "",
        }
    }

    pub fn apply(&mut self, chunk: NormalizedChunk) -> Applied {
        let Inner::Active { text } = &mut self.inner else {
            return Applied::Ignored;
        };

        if let Some(error) = chunk.error {
            self.inner = Inner::Failed;
            return Applied::Failed(error);
        }

        if chunk.done {
            // Content on the terminal chunk is authoritative.
            let final_text = match chunk.content.as_deref().map(str::trim) {
                Some(content) if !content.is_empty() => content.to_string(),
                _ => text.trim().to_string(),
            };
            return Applied::Finalized(self.finalize(final_text));
        }

        match chunk.content {
            Some(content) => {
                *text = merge_content(text, &content);
                Applied::Updated
            }
            None => Applied::Ignored,
        }
    }

    /// Handles the end of the stream. Emits the accumulated text if the turn
    /// is still active; returns `None` otherwise.
    pub fn finish(&mut self) -> Option<Message> {
        let Inner::Active { text } = &self.inner else {
            return None;
        };
        let final_text = text.trim().to_string();
        self.finalize(final_text)
    }

    /// Marks the turn as failed (transport error), discarding any text.
    pub fn fail(&mut self) {
        if matches!(self.inner, Inner::Active { .. }) {
            self.inner = Inner::Failed;
        }
    }

    /// Abandons the turn, discarding any text.
    pub fn cancel(&mut self) {
        if matches!(self.inner, Inner::Active { .. }) {
            self.inner = Inner::Cancelled;
        }
    }

    fn finalize(&mut self, final_text: String) -> Option<Message> {
        self.inner = Inner::Finalized;
        if final_text.is_empty() {
            None
        } else {
            Some(Message::assistant(final_text))
        }
    }
}

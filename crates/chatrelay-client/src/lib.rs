//! Client side of the chat relay.
//!
//! Sends a conversation to the relay, reads back the normalized chunk stream
//! and reconciles it into exactly one assistant message per turn.

pub mod cancel;
pub mod client;
pub mod error;
pub mod merge;
pub mod message;
pub mod reconciler;

pub use cancel::{TurnCancelHandle, TurnCancelReceiver};
pub use client::{RelayClient, reconcile_stream};
pub use error::{ClientError, Result};
pub use merge::merge_content;
pub use message::Message;
pub use reconciler::{Applied, Reconciler, TurnState};

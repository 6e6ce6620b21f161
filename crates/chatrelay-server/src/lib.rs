//! Chat relay server.
//!
//! Accepts a chat turn over HTTP, opens a streaming request against the
//! upstream provider and forwards its events as a normalized SSE stream.

pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod relay;
pub mod upstream;

pub use api::{AppState, RelayState, build_router};
pub use config::{ServerConfig, UpstreamConfig};
pub use error::{RelayError, Result};
pub use event::{UpstreamEvent, decode_event};
pub use relay::{Step, classify, relay_stream};
pub use upstream::UpstreamClient;

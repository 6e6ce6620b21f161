//! Wire contracts shared by the relay server and its clients.
//!
//! Both hops speak the same framing: newline-delimited records where the
//! records of interest start with `data:` and carry a JSON payload.

pub mod chat;
pub mod chunk;
pub mod framing;

pub use chat::{ChatRequest, ChatTurn, ErrorBody, Role};
pub use chunk::NormalizedChunk;
pub use framing::{DATA_PREFIX, DONE_MARKER, Frame, LineBuffer, parse_frame};

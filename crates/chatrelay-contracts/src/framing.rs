//! Line framing for event streams.
//!
//! Reads arrive in arbitrary slices; a record is only handed out once its
//! terminating newline has been seen. Decoding of the record payload is left
//! to the caller.

/// Prefix marking a record that carries a payload.
pub const DATA_PREFIX: &str = "data:";

/// Out-of-band terminal marker sent in place of a JSON payload.
pub const DONE_MARKER: &str = "[DONE]";

/// A record that survived prefix filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Payload following the `data:` prefix, not yet decoded.
    Data(&'a str),
    /// The literal terminal marker.
    Done,
}

/// Accumulates raw bytes and splits them into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    // Prefix of `buf` already known to hold no newline.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a read and returns every line completed by it, without the
    /// trailing `\n` / `\r\n`.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buf[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            lines.push(decode_line(&self.buf[start..end]));
            start = end + 1;
            from = start;
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();
        lines
    }

    /// Flushes a trailing record that never received its newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = decode_line(&self.buf);
        self.buf.clear();
        self.scanned = 0;
        if line.trim().is_empty() { None } else { Some(line) }
    }

    /// Number of bytes waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Classifies one line. Lines without the data prefix (blank separators,
/// `event:` names, `:` comments) yield `None`.
pub fn parse_frame(line: &str) -> Option<Frame<'_>> {
    let rest = line.strip_prefix(DATA_PREFIX)?;
    let payload = rest.strip_prefix(' ').unwrap_or(rest);
    if payload.trim() == DONE_MARKER {
        return Some(Frame::Done);
    }
    Some(Frame::Data(payload))
}

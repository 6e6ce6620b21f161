//! Content merge policy for ambiguous upstream updates.
//!
//! Upstream content updates are sometimes the full text so far and sometimes
//! only the newly generated suffix, without saying which. The policy:
//!
//! * an update at least as long as the current text, or one that starts with
//!   it, replaces the current text;
//! * anything else (shorter and not an extension) is appended.
//!
//! A shorter update that does not extend the text cannot be a full
//! replacement without dropping earlier output, so it is treated as a delta.

/// Merges `incoming` into `accumulated` and returns the new accumulated text.
pub fn merge_content(accumulated: &str, incoming: &str) -> String {
    if incoming.len() >= accumulated.len() || incoming.starts_with(accumulated) {
        incoming.to_string()
    } else {
        let mut merged = String::with_capacity(accumulated.len() + incoming.len());
        merged.push_str(accumulated);
        merged.push_str(incoming);
        merged
    }
}

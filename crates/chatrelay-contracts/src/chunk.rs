use serde::{Deserialize, Serialize};

/// One unit of the normalized protocol written by the relay.
///
/// Only four shapes are ever produced:
/// `{content}`, `{content, done}`, `{done}` and `{error, done}`.
/// Use the constructors rather than building the struct by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub done: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl NormalizedChunk {
    /// Content update, more chunks follow.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    /// Terminal chunk carrying the final content.
    pub fn final_content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            done: true,
            ..Self::default()
        }
    }

    /// Terminal chunk without content.
    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }

    /// Terminal error chunk.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            done: true,
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.done || self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        assert_eq!(
            serde_json::to_value(NormalizedChunk::content("Hel")).unwrap(),
            json!({"content": "Hel"})
        );
        assert_eq!(
            serde_json::to_value(NormalizedChunk::final_content("Hello")).unwrap(),
            json!({"content": "Hello", "done": true})
        );
        assert_eq!(
            serde_json::to_value(NormalizedChunk::done()).unwrap(),
            json!({"done": true})
        );
        assert_eq!(
            serde_json::to_value(NormalizedChunk::error("quota exceeded")).unwrap(),
            json!({"error": "quota exceeded", "done": true})
        );
    }

    #[test]
    fn test_lenient_decoding() {
        let chunk: NormalizedChunk = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(chunk, NormalizedChunk::content("x"));
        assert!(!chunk.is_terminal());

        let chunk: NormalizedChunk = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(chunk.is_terminal());
        assert!(!chunk.done);
    }
}

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One prior turn as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Inbound body of `POST /api/chat-messages`.
///
/// Only the most recent turn is forwarded upstream; earlier turns are
/// accepted for compatibility with chat front-ends that send the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    pub user: String,
}

impl ChatRequest {
    pub fn new(user: impl Into<String>, messages: Vec<ChatTurn>) -> Self {
        Self {
            messages,
            user: user.into(),
        }
    }

    /// Request holding a single user query.
    pub fn query(user: impl Into<String>, query: impl Into<String>) -> Self {
        Self::new(user, vec![ChatTurn::user(query)])
    }
}

/// Body of every non-streaming failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_round_trip_uses_lowercase_roles() {
        let request = ChatRequest::new(
            "user-1",
            vec![ChatTurn::user("hi"), ChatTurn::assistant("hello"), ChatTurn::user("more")],
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][1], json!({"role": "assistant", "content": "hello"}));
        assert_eq!(value["user"], "user-1");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<ChatRequest>(json!({
            "messages": [{"role": "tool", "content": "x"}],
            "user": "u"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorBody::new("No messages provided");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"error": "No messages provided"})
        );
        let body = ErrorBody::new("Upstream request failed").with_details("invalid api key");
        assert_eq!(body.details.as_deref(), Some("invalid api key"));
    }
}

//! Message and response types for LLM communication.

use serde::{Deserialize, Serialize};

/// Role of a message in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message providing context and instructions.
    System,
    /// User message (human input).
    User,
    /// Assistant message (LLM response).
    Assistant,
}

impl Role {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: Role,
    /// The content of the message.
    pub content: String,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// What a model returned: free text, or a decoded JSON value when the
/// provider was asked for structured output.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Plain completion text.
    Text(String),
    /// A structured response.
    Json(serde_json::Value),
}

impl ModelResponse {
    /// Decodes raw completion text.
    ///
    /// With `structured` set, text that parses as JSON becomes `Json`;
    /// anything else stays `Text`.
    pub fn from_content(content: String, structured: bool) -> Self {
        if structured {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(content.trim()) {
                return Self::Json(value);
            }
        }
        Self::Text(content)
    }

    /// Coerces the response to a string.
    ///
    /// A JSON object yields its `field` member (empty when absent, raw JSON
    /// text when not a string); other JSON values are stringified.
    pub fn into_text(self, field: &str) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(serde_json::Value::Object(map)) => match map.get(field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            Self::Json(serde_json::Value::String(s)) => s,
            Self::Json(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are a SQL expert.");
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, "You are a SQL expert.");

        let user = Message::user("Hello!");
        assert_eq!(user.role, Role::User);

        let assistant = Message::assistant("SELECT 1");
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::User).unwrap();
        assert_eq!(json, "\"user\"");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn test_from_content_plain_text() {
        let response = ModelResponse::from_content("SELECT 1".to_string(), true);
        assert_eq!(response, ModelResponse::Text("SELECT 1".to_string()));

        let response = ModelResponse::from_content("{\"query\": \"SELECT 1\"}".to_string(), false);
        assert!(matches!(response, ModelResponse::Text(_)));
    }

    #[test]
    fn test_from_content_structured() {
        let response =
            ModelResponse::from_content(" {\"query\": \"SELECT 1\"} ".to_string(), true);
        assert_eq!(response, ModelResponse::Json(json!({"query": "SELECT 1"})));
    }

    #[test]
    fn test_into_text_variants() {
        assert_eq!(
            ModelResponse::Text("raw".to_string()).into_text("query"),
            "raw"
        );
        assert_eq!(
            ModelResponse::Json(json!({"query": "SELECT year FROM t"})).into_text("query"),
            "SELECT year FROM t"
        );
        assert_eq!(
            ModelResponse::Json(json!({"sql": "SELECT 1"})).into_text("query"),
            ""
        );
        assert_eq!(
            ModelResponse::Json(json!({"query": 42})).into_text("query"),
            "42"
        );
        assert_eq!(ModelResponse::Json(json!([1, 2])).into_text("query"), "[1,2]");
    }
}

//! Text carried by a generative-text service reply.

use serde_json::Value;

/// The shapes a reply body can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
    /// `{"parts": [{"text": ...}, ...]}`; parts without text are dropped.
    Structured(Vec<String>),
    /// A bare JSON string, or `{"text": ...}`.
    PlainText(String),
    /// Anything else, kept as its JSON rendering.
    Unknown(String),
}

impl GeneratedContent {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => GeneratedContent::PlainText(s.clone()),
            Value::Object(map) => match (map.get("parts"), map.get("text")) {
                (Some(Value::Array(parts)), _) => GeneratedContent::Structured(
                    parts
                        .iter()
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect(),
                ),
                (_, Some(Value::String(s))) => GeneratedContent::PlainText(s.clone()),
                _ => GeneratedContent::Unknown(value.to_string()),
            },
            other => GeneratedContent::Unknown(other.to_string()),
        }
    }

    /// Parse a raw reply body; non-JSON bodies are plain text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(v) => Self::from_value(&v),
            Err(_) => GeneratedContent::PlainText(body.to_string()),
        }
    }

    /// Structured parts joined by newlines. An empty structured reply falls
    /// through to an empty string rather than the raw body.
    pub fn text(&self) -> String {
        match self {
            GeneratedContent::Structured(parts) => parts.join("\n"),
            GeneratedContent::PlainText(s) | GeneratedContent::Unknown(s) => s.clone(),
        }
    }
}

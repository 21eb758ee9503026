//! Request envelope and conversation builder.
//!
//! A [`ChatRequest`] is only ever produced by the schema validator in
//! `lmguard-foundation`; once built it is never mutated.

use serde::{Deserialize, Serialize};

/// One message of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Sampling options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_strings: Option<Vec<String>>,
}

/// A validated chat request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub options: ChatOptions,
}

/// Ordered conversation history.
///
/// A plain value: appending only touches this instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return `self` for chaining.
    pub fn append(&mut self, role: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

impl From<Vec<ChatMessage>> for Conversation {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_chains_and_preserves_order() {
        let mut chat = Conversation::new();
        chat.append("system", "be brief").append("user", "hi");
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.messages()[0], ChatMessage::system("be brief"));
        assert_eq!(chat.messages()[1], ChatMessage::user("hi"));
    }

    #[test]
    fn appending_to_a_clone_leaves_the_original_alone() {
        let mut base = Conversation::new();
        base.append("user", "first");
        let mut branch = base.clone();
        branch.append("assistant", "second");
        assert_eq!(base.len(), 1);
        assert_eq!(branch.len(), 2);
    }

    #[test]
    fn options_serialize_camel_case_and_skip_missing() {
        let opts = ChatOptions {
            max_tokens: Some(10),
            top_p: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json, serde_json::json!({ "maxTokens": 10, "topP": 0.5 }));
    }
}

//! Request bodies and response shapes for each upstream API flavor.

use lmguard_kernel::config::{ApiFlavor, FeatureSettings, LmStudioSettings};
use lmguard_kernel::{ChatMessage, ChatRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const GREETING_PATH: &str = "/lmstudio-greeting";
pub const MODELS_PATH: &str = "/v1/models";
pub const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";
pub const LMSTUDIO_V1_CHAT_PATH: &str = "/api/v1/chat";
pub const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";
pub const COMPLETIONS_PATH: &str = "/v1/completions";
pub const EMBEDDINGS_PATH: &str = "/v1/embeddings";

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";

/// A model advertised by `GET /v1/models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A normalized, non-streaming chat reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Server-side conversation id (`lmstudio-v1` stateful chats only).
    #[serde(rename = "chatId", default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embeddings {
    pub embeddings: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Chat path for the configured flavor. An empty custom endpoint falls back
/// to the OpenAI path.
pub fn chat_path(settings: &LmStudioSettings) -> &str {
    match settings.flavor() {
        ApiFlavor::LmStudioV1 => LMSTUDIO_V1_CHAT_PATH,
        ApiFlavor::Anthropic => ANTHROPIC_MESSAGES_PATH,
        ApiFlavor::Custom if !settings.custom_endpoint.is_empty() => {
            settings.custom_endpoint.as_str()
        }
        ApiFlavor::Custom | ApiFlavor::OpenAi => OPENAI_CHAT_PATH,
    }
}

/// Build the chat body for `flavor`.
///
/// `model` has already been resolved against the configured default.
pub fn chat_body(
    flavor: ApiFlavor,
    model: Option<&str>,
    request: &ChatRequest,
    lmstudio: &LmStudioSettings,
    features: &FeatureSettings,
    chat_id: Option<&str>,
) -> Value {
    let opts = &request.options;
    let messages = messages_json(&request.messages);
    let mut body = Map::new();

    match flavor {
        ApiFlavor::LmStudioV1 => {
            body.insert("messages".into(), messages);
            if lmstudio.use_stateful_chats {
                body.insert("chatId".into(), chat_id.map_or(Value::Null, Value::from));
            }
            if lmstudio.enable_mcp {
                body.insert("mcpServers".into(), json!([]));
            }
            if lmstudio.context_length > 0 {
                body.insert("contextLength".into(), json!(lmstudio.context_length));
            }
            if let Some(model) = model {
                body.insert("model".into(), json!(model));
            }
            if let Some(max) = opts.max_tokens {
                body.insert("maxPredictedTokens".into(), json!(max));
            }
            if let Some(t) = opts.temperature {
                body.insert("temperature".into(), json!(t));
            }
            if let Some(p) = opts.top_p.filter(|p| *p != 0.0) {
                body.insert("topP".into(), json!(p));
            }
            if let Some(stops) = &opts.stop_strings {
                body.insert("stopStrings".into(), json!(stops));
            }
        }
        ApiFlavor::Anthropic => {
            body.insert(
                "model".into(),
                json!(model.unwrap_or(DEFAULT_ANTHROPIC_MODEL)),
            );
            body.insert("messages".into(), messages);
            body.insert(
                "max_tokens".into(),
                json!(opts.max_tokens.unwrap_or(features.max_tokens)),
            );
            if let Some(t) = opts.temperature {
                body.insert("temperature".into(), json!(t));
            }
            if let Some(p) = opts.top_p.filter(|p| *p != 0.0) {
                body.insert("top_p".into(), json!(p));
            }
            if let Some(k) = opts.top_k {
                body.insert("top_k".into(), json!(k));
            }
        }
        ApiFlavor::OpenAi | ApiFlavor::Custom => {
            body.insert("model".into(), json!(model.unwrap_or_default()));
            body.insert("messages".into(), messages);
            body.insert(
                "max_tokens".into(),
                json!(opts.max_tokens.unwrap_or(features.max_tokens)),
            );
            body.insert(
                "temperature".into(),
                json!(opts.temperature.unwrap_or(features.temperature)),
            );
            body.insert("stream".into(), json!(false));
            if let Some(p) = opts.top_p.filter(|p| *p != 0.0) {
                body.insert("top_p".into(), json!(p));
            }
            if let Some(k) = opts.top_k {
                body.insert("top_k".into(), json!(k));
            }
            if let Some(stops) = &opts.stop_strings {
                body.insert("stop".into(), json!(stops));
            }
        }
    }

    Value::Object(body)
}

/// Normalize a chat response body. Missing fields become empty/`None`.
pub fn parse_chat_reply(flavor: ApiFlavor, data: &Value) -> ChatReply {
    let model = data.get("model").and_then(Value::as_str).map(str::to_string);
    match flavor {
        ApiFlavor::LmStudioV1 => ChatReply {
            content: str_at(data, "/content"),
            role: "assistant".to_string(),
            usage: data.get("stats").cloned(),
            model,
            chat_id: data.get("chatId").and_then(Value::as_str).map(str::to_string),
        },
        ApiFlavor::Anthropic => ChatReply {
            content: str_at(data, "/content/0/text"),
            role: role_or_assistant(data.pointer("/role")),
            usage: data.get("usage").cloned(),
            model,
            chat_id: None,
        },
        ApiFlavor::OpenAi | ApiFlavor::Custom => ChatReply {
            content: str_at(data, "/choices/0/message/content"),
            role: role_or_assistant(data.pointer("/choices/0/message/role")),
            usage: data.get("usage").cloned(),
            model,
            chat_id: None,
        },
    }
}

pub fn completion_body(
    model: Option<&str>,
    prompt: &str,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    features: &FeatureSettings,
) -> Value {
    json!({
        "model": model.unwrap_or_default(),
        "prompt": prompt,
        "max_tokens": max_tokens.unwrap_or(features.max_tokens),
        "temperature": temperature.unwrap_or(features.temperature),
        "stream": false,
    })
}

pub fn parse_completion(data: &Value) -> Completion {
    Completion {
        content: str_at(data, "/choices/0/text"),
        usage: data.get("usage").cloned(),
        model: data.get("model").and_then(Value::as_str).map(str::to_string),
    }
}

pub fn embeddings_body(model: Option<&str>, inputs: &[String]) -> Value {
    json!({
        "model": model.unwrap_or_default(),
        "input": inputs,
    })
}

pub fn parse_embeddings(data: &Value) -> Embeddings {
    let embeddings = data
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("embedding")
                        .and_then(Value::as_array)
                        .map(|v| v.iter().filter_map(Value::as_f64).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();
    Embeddings {
        embeddings,
        usage: data.get("usage").cloned(),
        model: data.get("model").and_then(Value::as_str).map(str::to_string),
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

fn messages_json(messages: &[ChatMessage]) -> Value {
    Value::Array(
        messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect(),
    )
}

fn str_at(data: &Value, pointer: &str) -> String {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn role_or_assistant(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .unwrap_or("assistant")
        .to_string()
}

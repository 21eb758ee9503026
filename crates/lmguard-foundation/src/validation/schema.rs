//! Request schema checks for inbound JSON bodies.
//!
//! Rules run in a fixed order and the first failure wins. Messages name the
//! offending field so they can be returned to the caller verbatim.

use lmguard_kernel::{ChatMessage, ChatOptions, ChatRequest, ValidationError};
use serde_json::{Map, Value};

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const MAX_TOKENS_RANGE: (i64, i64) = (1, 100_000);
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);
/// Longest accepted search query, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

/// Validate a chat request body.
pub fn validate_chat_request(body: &Value) -> Result<(), ValidationError> {
    parse_chat_request(body).map(|_| ())
}

/// Validate a chat request body and convert it into a [`ChatRequest`].
///
/// Numeric options given as numeric strings are accepted and converted.
pub fn parse_chat_request(body: &Value) -> Result<ChatRequest, ValidationError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "Invalid request data"))?;

    let messages = parse_messages(obj)?;
    let options = match obj.get("options") {
        None | Some(Value::Null) => ChatOptions::default(),
        Some(Value::Object(opts)) => parse_options(opts)?,
        Some(_) => {
            return Err(ValidationError::new("options", "options must be an object"));
        }
    };
    let model = match obj.get("model") {
        None => None,
        Some(Value::String(model)) => Some(model.clone()),
        Some(_) => return Err(ValidationError::new("model", "model must be a string")),
    };

    Ok(ChatRequest {
        messages,
        model,
        options,
    })
}

/// Validate a library search query.
pub fn validate_search_query(query: &Value) -> Result<(), ValidationError> {
    let query = match query {
        Value::String(q) if !q.is_empty() => q,
        _ => return Err(ValidationError::new("query", "Query must be a non-empty string")),
    };
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::new(
            "query",
            format!("Query too long (max {MAX_QUERY_CHARS} characters)"),
        ));
    }
    if query.trim().is_empty() {
        return Err(ValidationError::new(
            "query",
            "Query cannot be empty or whitespace only",
        ));
    }
    Ok(())
}

fn parse_messages(obj: &Map<String, Value>) -> Result<Vec<ChatMessage>, ValidationError> {
    let messages = obj
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ValidationError::new("messages", "messages must be an array"))?;

    if messages.is_empty() {
        return Err(ValidationError::new(
            "messages",
            "messages array cannot be empty",
        ));
    }

    messages
        .iter()
        .enumerate()
        .map(|(idx, msg)| {
            let msg = msg.as_object().ok_or_else(|| {
                ValidationError::new(
                    format!("messages[{idx}]"),
                    format!("Invalid message at index {idx}"),
                )
            })?;
            let role = non_empty_str(msg, "role").ok_or_else(|| {
                ValidationError::new(
                    format!("messages[{idx}].role"),
                    format!("Missing or invalid role at index {idx}"),
                )
            })?;
            let content = non_empty_str(msg, "content").ok_or_else(|| {
                ValidationError::new(
                    format!("messages[{idx}].content"),
                    format!("Missing or invalid content at index {idx}"),
                )
            })?;
            Ok(ChatMessage::new(role, content))
        })
        .collect()
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn parse_options(opts: &Map<String, Value>) -> Result<ChatOptions, ValidationError> {
    let mut options = ChatOptions::default();

    if let Some(value) = opts.get("temperature") {
        let temperature = as_float(value)
            .filter(|t| in_range(*t, TEMPERATURE_RANGE))
            .ok_or_else(|| {
                ValidationError::new(
                    "options.temperature",
                    "temperature must be between 0 and 2",
                )
            })?;
        options.temperature = Some(temperature);
    }

    if let Some(value) = opts.get("maxTokens") {
        let (lo, hi) = MAX_TOKENS_RANGE;
        let max_tokens = as_integer(value)
            .filter(|n| (lo..=hi).contains(n))
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                ValidationError::new(
                    "options.maxTokens",
                    "maxTokens must be between 1 and 100000",
                )
            })?;
        options.max_tokens = Some(max_tokens);
    }

    if let Some(value) = opts.get("topP") {
        let top_p = as_float(value)
            .filter(|p| in_range(*p, TOP_P_RANGE))
            .ok_or_else(|| ValidationError::new("options.topP", "topP must be between 0 and 1"))?;
        options.top_p = Some(top_p);
    }

    if let Some(value) = opts.get("topK") {
        let top_k = as_integer(value)
            .filter(|k| *k >= 1)
            .and_then(|k| u32::try_from(k).ok())
            .ok_or_else(|| {
                ValidationError::new("options.topK", "topK must be a positive integer")
            })?;
        options.top_k = Some(top_k);
    }

    if let Some(value) = opts.get("stopStrings") {
        let stops = value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|s| s.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                ValidationError::new(
                    "options.stopStrings",
                    "stopStrings must be an array of strings",
                )
            })?;
        options.stop_strings = Some(stops);
    }

    Ok(options)
}

fn in_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    (lo..=hi).contains(&value)
}

/// A JSON number, or a string holding one.
fn as_float(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Like [`as_float`], truncating toward zero.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(body: Value) -> String {
        validate_chat_request(&body).unwrap_err().message
    }

    #[test]
    fn minimal_request_passes() {
        let body = json!({"messages": [{"role": "user", "content": "hi"}]});
        assert!(validate_chat_request(&body).is_ok());
    }

    #[test]
    fn empty_messages_fail() {
        assert_eq!(message(json!({"messages": []})), "messages array cannot be empty");
    }

    #[test]
    fn body_must_be_object() {
        for body in [Value::Null, json!("x"), json!(3), json!([])] {
            assert_eq!(message(body), "Invalid request data");
        }
        assert_eq!(message(json!({})), "messages must be an array");
        assert_eq!(message(json!({"messages": "hi"})), "messages must be an array");
    }

    #[test]
    fn message_errors_report_index() {
        let err = validate_chat_request(&json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "", "content": "x"}
            ]
        }))
        .unwrap_err();
        assert_eq!(err.message, "Missing or invalid role at index 1");
        assert_eq!(err.field, "messages[1].role");

        assert_eq!(
            message(json!({"messages": [{"role": "user", "content": 5}]})),
            "Missing or invalid content at index 0"
        );
        assert_eq!(
            message(json!({"messages": [null]})),
            "Invalid message at index 0"
        );
    }

    #[test]
    fn temperature_out_of_range_fails() {
        let base = |temperature: Value| {
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "options": {"temperature": temperature}
            })
        };
        assert_eq!(message(base(json!(3))), "temperature must be between 0 and 2");
        assert_eq!(message(base(json!(-0.1))), "temperature must be between 0 and 2");
        assert_eq!(message(base(json!("warm"))), "temperature must be between 0 and 2");
        assert!(validate_chat_request(&base(json!(2))).is_ok());
        assert!(validate_chat_request(&base(json!("0.5"))).is_ok());
    }

    #[test]
    fn first_failing_option_wins() {
        let body = json!({
            "messages": [{"role": "user", "content": "hi"}],
            "options": {"temperature": 9, "maxTokens": 0, "topP": 5},
            "model": 1
        });
        assert_eq!(message(body), "temperature must be between 0 and 2");

        let body = json!({
            "messages": [{"role": "user", "content": "hi"}],
            "options": {"maxTokens": 0, "topP": 5}
        });
        assert_eq!(message(body), "maxTokens must be between 1 and 100000");
    }

    #[test]
    fn numeric_strings_are_converted() {
        let req = parse_chat_request(&json!({
            "messages": [{"role": "user", "content": "hi"}],
            "options": {"maxTokens": "256", "topP": 0.9, "topK": 40.0, "stopStrings": ["\n\n"]},
            "model": "qwen"
        }))
        .unwrap();
        assert_eq!(req.options.max_tokens, Some(256));
        assert_eq!(req.options.top_p, Some(0.9));
        assert_eq!(req.options.top_k, Some(40));
        assert_eq!(req.options.stop_strings, Some(vec!["\n\n".to_string()]));
        assert_eq!(req.model.as_deref(), Some("qwen"));
    }

    #[test]
    fn fractional_max_tokens_truncate() {
        let req = parse_chat_request(&json!({
            "messages": [{"role": "user", "content": "hi"}],
            "options": {"maxTokens": 100.9}
        }))
        .unwrap();
        assert_eq!(req.options.max_tokens, Some(100));
        assert_eq!(
            message(json!({
                "messages": [{"role": "user", "content": "hi"}],
                "options": {"maxTokens": 100000.5, "topP": 1.5}
            })),
            "topP must be between 0 and 1"
        );
    }

    #[test]
    fn model_must_be_string_when_present() {
        assert_eq!(
            message(json!({"messages": [{"role": "user", "content": "hi"}], "model": 7})),
            "model must be a string"
        );
        assert_eq!(
            message(json!({"messages": [{"role": "user", "content": "hi"}], "model": null})),
            "model must be a string"
        );
    }

    #[test]
    fn options_shape() {
        assert!(
            validate_chat_request(&json!({
                "messages": [{"role": "user", "content": "hi"}],
                "options": null
            }))
            .is_ok()
        );
        assert_eq!(
            message(json!({"messages": [{"role": "user", "content": "hi"}], "options": 4})),
            "options must be an object"
        );
    }

    #[test]
    fn search_query_rules() {
        assert!(validate_search_query(&json!("transformers")).is_ok());
        assert_eq!(
            validate_search_query(&json!("")).unwrap_err().message,
            "Query must be a non-empty string"
        );
        assert_eq!(
            validate_search_query(&json!(12)).unwrap_err().message,
            "Query must be a non-empty string"
        );
        assert_eq!(
            validate_search_query(&json!("   ")).unwrap_err().message,
            "Query cannot be empty or whitespace only"
        );
        assert_eq!(
            validate_search_query(&json!("x".repeat(1001))).unwrap_err().message,
            "Query too long (max 1000 characters)"
        );
        assert!(validate_search_query(&json!("é".repeat(1000))).is_ok());
    }
}

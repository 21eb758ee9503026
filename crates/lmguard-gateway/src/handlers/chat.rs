//! Chat endpoint
//!
//! POST /lmstudio/chat - validate a chat body, forward it upstream and return
//! the sanitized reply

use axum::body::Bytes;
use axum::extract::State;
use lmguard_foundation::{parse_chat_request, sanitize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::HandlerReply;
use crate::error::{GatewayError, GatewayResult};
use crate::state::AppState;

/// POST /lmstudio/chat
///
/// Body: `{messages, model?, options?, chatId?}`. Nothing reaches the
/// upstream server unless the body passes schema validation.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> GatewayResult<HandlerReply> {
    let data: Value = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::InvalidRequest("Invalid request data".to_string()))?;
    let request = parse_chat_request(&data)?;
    let chat_id = data.get("chatId").and_then(Value::as_str);

    let settings = state.settings();
    let cancel = CancellationToken::new();
    // Client disconnect drops this future and aborts the upstream call.
    let _abort_on_drop = cancel.clone().drop_guard();

    let request_id = Uuid::new_v4();
    debug!(%request_id, messages = request.messages.len(), "forwarding chat request");
    let mut reply = state
        .upstream
        .chat(
            &settings,
            settings.lmstudio.base_url(),
            &request,
            chat_id,
            &cancel,
        )
        .await
        .map_err(|e| {
            warn!(%request_id, error = %e, "upstream chat failed");
            GatewayError::Downstream(e.to_string())
        })?;

    reply.content = sanitize(&reply.content);
    Ok(HandlerReply::ok(&reply))
}

pub fn chat_router() -> axum::Router<AppState> {
    use axum::routing::post;
    axum::Router::new().route("/lmstudio/chat", post(chat))
}

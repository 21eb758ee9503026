//! Status endpoint
//!
//! GET /lmstudio/status - gateway version and upstream reachability

use axum::extract::State;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::HandlerReply;
use crate::state::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /lmstudio/status
pub async fn status(State(state): State<AppState>) -> HandlerReply {
    let settings = state.settings();
    let cancel = CancellationToken::new();
    let _abort_on_drop = cancel.clone().drop_guard();

    let connected = state
        .upstream
        .check_server(&settings, settings.lmstudio.base_url(), &cancel)
        .await;

    HandlerReply::ok(&json!({
        "status": "ok",
        "version": VERSION,
        "lmstudioConnected": connected,
        "lmstudioUrl": settings.lmstudio.url,
    }))
}

pub fn status_router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new().route("/lmstudio/status", get(status))
}

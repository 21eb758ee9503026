//! GET /lmstudio/models - models advertised by the upstream server

use axum::extract::State;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::HandlerReply;
use crate::state::AppState;

pub async fn models(State(state): State<AppState>) -> HandlerReply {
    let settings = state.settings();
    let cancel = CancellationToken::new();
    let _abort_on_drop = cancel.clone().drop_guard();

    let models = state
        .upstream
        .list_models(&settings, settings.lmstudio.base_url(), &cancel)
        .await;
    HandlerReply::ok(&json!({ "models": models }))
}

pub fn models_router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new().route("/lmstudio/models", get(models))
}

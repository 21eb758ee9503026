//! POST /lmstudio/search - library search

use axum::body::Bytes;
use axum::extract::State;
use lmguard_foundation::validate_search_query;
use serde_json::Value;
use tracing::warn;

use super::HandlerReply;
use crate::error::{GatewayError, GatewayResult};
use crate::search::{MAX_RESULTS, SearchHit};
use crate::state::AppState;

/// Body: `{query}`. Returns at most [`MAX_RESULTS`] hits.
pub async fn search(State(state): State<AppState>, body: Bytes) -> GatewayResult<HandlerReply> {
    let data: Value = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::InvalidRequest("Invalid request data".to_string()))?;
    let query = data.get("query").unwrap_or(&Value::Null);
    validate_search_query(query)?;
    let query = query.as_str().unwrap_or_default();

    let items = state.library.search(query).await.map_err(|e| {
        warn!(error = %e, "library search failed");
        GatewayError::Downstream(e.to_string())
    })?;

    let hits: Vec<SearchHit> = items.iter().take(MAX_RESULTS).map(SearchHit::from).collect();
    Ok(HandlerReply::ok(&hits))
}

pub fn search_router() -> axum::Router<AppState> {
    use axum::routing::post;
    axum::Router::new().route("/lmstudio/search", post(search))
}

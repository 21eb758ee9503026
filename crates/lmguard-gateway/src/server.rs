//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires the handlers, the API-key filter and request
//! tracing into a running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/lmstudio/status` | Version and upstream reachability. |
//! | `GET`  | `/lmstudio/models` | Models advertised upstream. |
//! | `POST` | `/lmstudio/chat` | Validated, sanitized chat round trip. |
//! | `POST` | `/lmstudio/search` | Library search, at most 20 hits. |
//!
//! Every route sits behind [`require_api_key`].

use crate::filter::require_api_key;
use crate::handlers::{chat_router, models_router, search_router, status_router};
use crate::state::AppState;
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full router over `state`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(status_router())
        .merge(models_router())
        .merge(chat_router())
        .merge(search_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct GatewayServer {
    state: AppState,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn build_app(&self) -> Router {
        build_app(self.state.clone())
    }

    /// Bind to `server.host:server.port` from the current settings and serve
    /// until the process exits.
    pub async fn start(self) -> std::io::Result<()> {
        let settings = self.state.settings();
        let addr = format!("{}:{}", settings.server.host, settings.server.port);
        let app = self.build_app();
        info!(
            addr = %addr,
            auth_required = settings.server.require_auth,
            upstream = %settings.lmstudio.url,
            "lmguard gateway starting"
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await
    }
}

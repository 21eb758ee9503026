//! Request handlers for the `/lmstudio/*` API

pub mod chat;
pub mod models;
pub mod search;
pub mod status;

pub use chat::chat_router;
pub use models::models_router;
pub use search::search_router;
pub use status::status_router;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// What every handler produces: status, content type and a rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl HandlerReply {
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        // Serializing plain JSON values and derived structs cannot fail.
        let body = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn ok<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::json(StatusCode::OK, value)
    }
}

impl IntoResponse for HandlerReply {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            Body::from(self.body),
        )
            .into_response()
    }
}

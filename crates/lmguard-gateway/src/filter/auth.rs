//! API-key authentication filter.
//!
//! Accepts requests that carry the active credential in either:
//! - `X-Api-Key: <key>` header
//! - `Authorization: Bearer <key>` header
//!
//! When `server.requireAuth` is off every request passes. Otherwise a missing
//! or wrong key gets `401 {"error": "Unauthorized"}` before any handler runs.

use crate::error::GatewayError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub fn extract_key(headers: &HeaderMap) -> Option<&str> {
    // `X-Api-Key` first (simpler, explicit).
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

/// axum middleware: run with `middleware::from_fn_with_state`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    // Reads `server.apiKey` and `server.requireAuth` from a fresh snapshot.
    let presented = extract_key(request.headers());
    if state.credentials.check(presented) {
        next.run(request).await
    } else {
        GatewayError::Unauthorized.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>, x_api: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(v) = auth {
            map.insert("authorization", HeaderValue::from_str(v).unwrap());
        }
        if let Some(v) = x_api {
            map.insert("x-api-key", HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn x_api_key_wins_over_bearer() {
        assert_eq!(
            extract_key(&headers(Some("Bearer b"), Some("x"))),
            Some("x")
        );
    }

    #[test]
    fn bearer_is_read() {
        assert_eq!(extract_key(&headers(Some("Bearer sk-1"), None)), Some("sk-1"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(extract_key(&headers(Some("Basic abc"), None)), None);
        assert_eq!(extract_key(&headers(None, None)), None);
    }
}

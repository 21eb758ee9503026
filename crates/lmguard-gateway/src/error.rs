//! Gateway error types
//!
//! Every error renders as `{"error": "<message>"}`:
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Unauthorized` | 401 |
//! | `InvalidRequest` | 400 |
//! | `Downstream` | 500 |

use crate::handlers::HandlerReply;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lmguard_kernel::{GuardError, ValidationError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    /// Schema validation failed; nothing was sent upstream.
    #[error("{0}")]
    InvalidRequest(String),

    /// Validation passed but producing the answer failed.
    #[error("{0}")]
    Downstream(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Downstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reply(&self) -> HandlerReply {
        HandlerReply::json(self.status(), &json!({ "error": self.to_string() }))
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::InvalidRequest(err.message)
    }
}

impl From<GuardError> for GatewayError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Validation(v) => v.into(),
            GuardError::Auth => GatewayError::Unauthorized,
            other => GatewayError::Downstream(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.reply().into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lmguard_kernel::EndpointRejection;

    #[test]
    fn guard_errors_map_to_contract_statuses() {
        let empty = ValidationError::new("messages", "messages array cannot be empty");
        let validation: GatewayError = GuardError::from(empty).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "messages array cannot be empty");

        let auth: GatewayError = GuardError::Auth.into();
        assert_eq!(auth.status(), StatusCode::UNAUTHORIZED);

        for err in [
            GuardError::Timeout { timeout_ms: 10 },
            GuardError::Network("refused".into()),
            GuardError::UnsafeEndpoint(EndpointRejection::PrivateRange),
            GuardError::Http {
                status: 502,
                body: "bad gateway".into(),
            },
        ] {
            let mapped: GatewayError = err.into();
            assert_eq!(mapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn reply_body_is_error_object() {
        let reply = GatewayError::Unauthorized.reply();
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.content_type, "application/json");
        assert_eq!(reply.body, r#"{"error":"Unauthorized"}"#);
    }
}

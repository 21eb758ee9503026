//! Error taxonomy for the trust boundary.
//!
//! Validation and auth failures are raised synchronously, before any network
//! call. Transport failures (`Timeout`, `Network`) are only surfaced once the
//! retry budget is spent. `Http` carries an upstream non-2xx response the
//! caller chose to treat as fatal; nothing here interprets status codes.

use thiserror::Error;

/// Malformed or out-of-bounds caller input.
///
/// Displays as its message, which always names the violated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Field path where validation failed (e.g. `messages[0].role`, `options.topP`).
    pub field: String,
    /// Human-readable message returned to the caller.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The rule that rejected an outbound destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EndpointRejection {
    #[error("url does not parse")]
    Malformed,

    #[error("scheme is not http or https")]
    Scheme,

    #[error("url has no host")]
    MissingHost,

    #[error("remote servers are not allowed")]
    RemoteNotAllowed,

    #[error("host is a cloud metadata service")]
    MetadataHost,

    #[error("host is in a private or link-local range")]
    PrivateRange,

    #[error("host is not in the trusted host list")]
    NotTrusted,

    #[error("port is outside 1-65535")]
    Port,
}

/// Every failure the trust-boundary layer can report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GuardError {
    // ── Caller input ─────────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unauthorized")]
    Auth,

    // ── Policy ───────────────────────────────────────────────────────────────
    /// Destination rejected by the trust policy. Never retried, and distinct
    /// from a network failure.
    #[error("Invalid or unsafe server URL ({0})")]
    UnsafeEndpoint(EndpointRejection),

    // ── Transport (retried) ──────────────────────────────────────────────────
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    // ── Upstream ─────────────────────────────────────────────────────────────
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The caller cancelled the request during a network wait or backoff.
    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid upstream response: {0}")]
    Decode(String),
}

impl GuardError {
    /// `true` for failures that happen before any network side effect.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GuardError::Validation(_) | GuardError::Auth | GuardError::UnsafeEndpoint(_)
        )
    }
}

pub type GuardResult<T> = Result<T, GuardError>;

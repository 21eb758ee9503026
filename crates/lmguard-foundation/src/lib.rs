//! `lmguard-foundation`: the trust-boundary layer.
//!
//! Control flow for one inbound call:
//!
//! 1. [`check_credential`] gates the caller
//! 2. [`validate_chat_request`] / [`validate_search_query`] check the body
//! 3. [`secure_request`] checks the destination ([`is_allowed_endpoint`]) and
//!    runs the resilient fetch loop
//! 4. [`sanitize`] cleans any text that will be rendered or stored
//!
//! The free functions at the crate root are the collaborator-facing surface;
//! the modules hold the types behind them.

pub mod http;
pub mod lmstudio;
pub mod security;
pub mod validation;

pub use http::{ReqwestTransport, ResilientFetch, SecureClient, secure_request};
pub use lmstudio::LmStudioClient;
pub use security::{
    CredentialManager, check_credential, check_endpoint, generate_credential, is_allowed_endpoint,
};
pub use validation::{
    parse_chat_request, render_note, sanitize, sanitize_value, validate_chat_request,
    validate_search_query,
};

pub use tokio_util::sync::CancellationToken;

//! `lmguard-kernel`: trust-boundary contracts.
//!
//! This crate defines the *plain data and trait interfaces* shared by the
//! lmguard crates. No network I/O happens here; implementations live in
//! `lmguard-foundation` (validators, fetch) and `lmguard-gateway` (inbound
//! HTTP surface).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 lmguard-kernel  (this crate)                 │
//! │  TrustPolicy  RetryPolicy  ChatRequest  Conversation         │
//! │  Credential   GuardError   HttpTransport  GuardSettings      │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │  depends on
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                 lmguard-foundation                           │
//! │  endpoint validator   sanitizer   schema validator           │
//! │  credential manager   resilient fetch   LM Studio client     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼───────────────────────────────┐
//! │                 lmguard-gateway  (axum)                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod policy;
pub mod request;
pub mod transport;

pub use config::{GuardSettings, SettingsStore, SharedSettings};
pub use credential::Credential;
pub use error::{EndpointRejection, GuardError, GuardResult, ValidationError};
pub use policy::{RetryPolicy, TrustPolicy};
pub use request::{ChatMessage, ChatOptions, ChatRequest, Conversation};
pub use transport::{HttpMethod, HttpResponse, HttpTransport, OutboundRequest, TransportError};

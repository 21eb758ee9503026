//! Outbound destination policy and inbound credentials.

pub mod credential;
pub mod endpoint;

pub use credential::{CredentialManager, check_credential, generate_credential};
pub use endpoint::{check_endpoint, is_allowed_endpoint};

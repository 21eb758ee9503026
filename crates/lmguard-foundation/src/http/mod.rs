//! Outbound HTTP: the resilient fetch loop, its reqwest transport, and the
//! endpoint-checked client built on both.

mod reqwest_transport;
mod retry;
mod secure;

pub use reqwest_transport::ReqwestTransport;
pub use retry::ResilientFetch;
pub use secure::{SecureClient, secure_request};

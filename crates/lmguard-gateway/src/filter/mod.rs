//! Filter module.

mod auth;

pub use auth::{extract_key, require_api_key};

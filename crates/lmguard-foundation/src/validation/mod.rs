//! Caller-input checks and output sanitization.
//!
//! - [`schema`]: shape and numeric bounds of inbound chat/search bodies
//! - [`sanitizer`]: tree-based markup sanitizer for untrusted model output
//!
//! Everything here is synchronous and side-effect free.

pub mod sanitizer;
pub mod schema;

pub use sanitizer::{render_note, sanitize, sanitize_value};
pub use schema::{parse_chat_request, validate_chat_request, validate_search_query};

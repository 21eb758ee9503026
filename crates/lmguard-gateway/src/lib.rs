//! `lmguard-gateway`: authenticated local HTTP surface.
//!
//! Inbound contract:
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | Missing or wrong API key | 401 | `{"error":"Unauthorized"}` |
//! | Schema validation failed | 400 | `{"error":"<validation message>"}` |
//! | Anything after validation failed | 500 | `{"error":"<message>"}` |
//!
//! Authentication always runs before validation, and validation before any
//! upstream call.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use lmguard_foundation::{LmStudioClient, ReqwestTransport};
//! use lmguard_gateway::{AppState, GatewayServer, InMemoryLibrary};
//! use lmguard_kernel::SharedSettings;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let upstream = LmStudioClient::with_transport(Arc::new(ReqwestTransport::new()?));
//!     let state = AppState::new(
//!         Arc::new(SharedSettings::default()),
//!         upstream,
//!         Arc::new(InMemoryLibrary::new()),
//!     );
//!     GatewayServer::new(state).start().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod filter;
pub mod handlers;
pub mod search;
pub mod server;
pub mod state;

pub use error::{GatewayError, GatewayResult};
pub use handlers::HandlerReply;
pub use search::{InMemoryLibrary, LibraryItem, LibrarySearch, SearchError, SearchHit};
pub use server::{GatewayServer, build_app};
pub use state::AppState;

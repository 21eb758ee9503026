//! OpenAI-compatible / LM Studio upstream client.
//!
//! The body and path of a chat call depend on `lmstudio.apiVersion`:
//!
//! | flavor        | path                   | token limit field      |
//! |---------------|------------------------|------------------------|
//! | `openai`      | `/v1/chat/completions` | `max_tokens`           |
//! | `lmstudio-v1` | `/api/v1/chat`         | `maxPredictedTokens`   |
//! | `anthropic`   | `/v1/messages`         | `max_tokens`           |
//! | `custom`      | `customEndpoint`       | `max_tokens`           |
//!
//! Streaming is not supported.

mod client;
pub mod wire;

pub use client::{DISCOVERY_PORTS, DiscoveredServer, LmStudioClient};
pub use wire::{ChatReply, Completion, Embeddings, ModelInfo, estimate_tokens};

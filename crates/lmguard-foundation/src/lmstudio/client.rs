//! Upstream model server client.

use super::wire::{
    self, COMPLETIONS_PATH, ChatReply, Completion, EMBEDDINGS_PATH, Embeddings, GREETING_PATH,
    MODELS_PATH, ModelInfo,
};
use crate::http::SecureClient;
use lmguard_kernel::{
    ChatOptions, ChatRequest, GuardResult, GuardSettings, HttpTransport, OutboundRequest,
    RetryPolicy,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Ports probed by [`LmStudioClient::discover_server`], in order.
pub const DISCOVERY_PORTS: [u16; 3] = [1234, 8080, 3000];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredServer {
    pub url: String,
    pub port: u16,
}

/// Client for an OpenAI-compatible / LM Studio server.
///
/// Every call goes through [`SecureClient`], so the destination is checked
/// against the trust policy of the `settings` snapshot passed in, and the
/// retry policy of that same snapshot applies.
#[derive(Debug, Clone)]
pub struct LmStudioClient {
    http: SecureClient,
}

impl LmStudioClient {
    pub fn new(http: SecureClient) -> Self {
        Self { http }
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(SecureClient::new(transport))
    }

    /// `true` if `base` answers the LM Studio greeting.
    pub async fn check_server(
        &self,
        settings: &GuardSettings,
        base: &str,
        cancel: &CancellationToken,
    ) -> bool {
        self.greet(settings, base, &settings.retry_policy(), cancel)
            .await
    }

    /// Probe the loopback ports LM Studio usually listens on. Each probe is a
    /// single attempt.
    pub async fn discover_server(
        &self,
        settings: &GuardSettings,
        cancel: &CancellationToken,
    ) -> Option<DiscoveredServer> {
        let probe = RetryPolicy::no_retry(settings.retry_policy().timeout_ms);
        for port in DISCOVERY_PORTS {
            let url = format!("http://127.0.0.1:{port}");
            if self.greet(settings, &url, &probe, cancel).await {
                info!(port, "discovered LM Studio server");
                return Some(DiscoveredServer { url, port });
            }
        }
        None
    }

    /// Models advertised by the server. Failures are logged and yield an
    /// empty list.
    pub async fn list_models(
        &self,
        settings: &GuardSettings,
        base: &str,
        cancel: &CancellationToken,
    ) -> Vec<ModelInfo> {
        let request = OutboundRequest::get(format!("{base}{MODELS_PATH}"));
        let data = match self.send_json(settings, &request, cancel).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "failed to list models");
                return Vec::new();
            }
        };
        data.get("data")
            .cloned()
            .and_then(|models| serde_json::from_value(models).ok())
            .unwrap_or_default()
    }

    /// Id of the first advertised model.
    pub async fn loaded_model(
        &self,
        settings: &GuardSettings,
        base: &str,
        cancel: &CancellationToken,
    ) -> Option<String> {
        self.list_models(settings, base, cancel)
            .await
            .into_iter()
            .map(|m| m.id)
            .find(|id| !id.is_empty())
    }

    /// Non-streaming chat. `request.model` wins over the configured default
    /// model. A non-2xx answer is an error.
    #[instrument(skip_all, fields(flavor = ?settings.lmstudio.flavor()))]
    pub async fn chat(
        &self,
        settings: &GuardSettings,
        base: &str,
        request: &ChatRequest,
        chat_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> GuardResult<ChatReply> {
        let flavor = settings.lmstudio.flavor();
        let model = resolve_model(request.model.as_deref(), settings);
        let body = wire::chat_body(
            flavor,
            model,
            request,
            &settings.lmstudio,
            &settings.features,
            chat_id,
        );
        let path = wire::chat_path(&settings.lmstudio);
        debug!(messages = request.messages.len(), "sending chat request");

        let outbound = OutboundRequest::post_json(format!("{base}{path}"), &body);
        let data = self.send_json(settings, &outbound, cancel).await?;
        Ok(wire::parse_chat_reply(flavor, &data))
    }

    /// Plain text completion.
    pub async fn complete(
        &self,
        settings: &GuardSettings,
        base: &str,
        model: Option<&str>,
        prompt: &str,
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> GuardResult<Completion> {
        let model = resolve_model(model, settings);
        let body = wire::completion_body(
            model,
            prompt,
            options.max_tokens,
            options.temperature,
            &settings.features,
        );
        let outbound = OutboundRequest::post_json(format!("{base}{COMPLETIONS_PATH}"), &body);
        let data = self.send_json(settings, &outbound, cancel).await?;
        Ok(wire::parse_completion(&data))
    }

    /// Embeddings for each input, in order.
    pub async fn embed(
        &self,
        settings: &GuardSettings,
        base: &str,
        model: Option<&str>,
        inputs: &[String],
        cancel: &CancellationToken,
    ) -> GuardResult<Embeddings> {
        let model = resolve_model(model, settings);
        let body = wire::embeddings_body(model, inputs);
        let outbound = OutboundRequest::post_json(format!("{base}{EMBEDDINGS_PATH}"), &body);
        let data = self.send_json(settings, &outbound, cancel).await?;
        Ok(wire::parse_embeddings(&data))
    }

    async fn greet(
        &self,
        settings: &GuardSettings,
        base: &str,
        retry: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> bool {
        let request = OutboundRequest::get(format!("{base}{GREETING_PATH}"));
        match self
            .http
            .send(&request, &settings.trust_policy(), retry, cancel)
            .await
        {
            Ok(response) if response.is_success() => response
                .json::<Value>()
                .map(|data| data.get("lmstudio") == Some(&Value::Bool(true)))
                .unwrap_or(false),
            Ok(_) => false,
            Err(e) => {
                debug!(error = %e, "greeting probe failed");
                false
            }
        }
    }

    async fn send_json(
        &self,
        settings: &GuardSettings,
        request: &OutboundRequest,
        cancel: &CancellationToken,
    ) -> GuardResult<Value> {
        self.http
            .send(
                request,
                &settings.trust_policy(),
                &settings.retry_policy(),
                cancel,
            )
            .await?
            .error_for_status()?
            .json()
    }
}

fn resolve_model<'a>(requested: Option<&'a str>, settings: &'a GuardSettings) -> Option<&'a str> {
    requested
        .filter(|m| !m.is_empty())
        .or_else(|| Some(settings.lmstudio.model.as_str()).filter(|m| !m.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_model_beats_configured_default() {
        let mut settings = GuardSettings::default();
        assert_eq!(resolve_model(None, &settings), None);
        settings.lmstudio.model = "configured".into();
        assert_eq!(resolve_model(None, &settings), Some("configured"));
        assert_eq!(resolve_model(Some(""), &settings), Some("configured"));
        assert_eq!(resolve_model(Some("asked"), &settings), Some("asked"));
    }
}

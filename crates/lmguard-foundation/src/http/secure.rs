//! Endpoint check followed by resilient fetch.

use super::{ReqwestTransport, ResilientFetch};
use crate::security::check_endpoint;
use lmguard_kernel::{
    GuardError, GuardResult, HttpResponse, HttpTransport, OutboundRequest, RetryPolicy,
    TrustPolicy,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// An outbound client that refuses destinations rejected by the trust
/// policy before any byte leaves the host.
///
/// Both policies are passed per call so a settings change applies to the
/// very next request.
#[derive(Clone)]
pub struct SecureClient {
    fetch: ResilientFetch,
}

impl SecureClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            fetch: ResilientFetch::new(transport),
        }
    }

    /// Client over the default `reqwest` transport.
    pub fn with_default_transport() -> GuardResult<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    pub async fn send(
        &self,
        request: &OutboundRequest,
        policy: &TrustPolicy,
        retry: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> GuardResult<HttpResponse> {
        if let Err(rule) = check_endpoint(&request.url, policy) {
            let host = url::Url::parse(&request.url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();
            warn!(%host, %rule, "blocked outbound request");
            return Err(GuardError::UnsafeEndpoint(rule));
        }
        self.fetch.execute(request, retry, cancel).await
    }
}

impl std::fmt::Debug for SecureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureClient").finish_non_exhaustive()
    }
}

/// One-off secure request over a fresh `reqwest` transport.
///
/// Long-lived callers should keep a [`SecureClient`] instead so the
/// connection pool is reused.
pub async fn secure_request(
    url: &str,
    request: OutboundRequest,
    policy: &TrustPolicy,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> GuardResult<HttpResponse> {
    let request = OutboundRequest {
        url: url.to_string(),
        ..request
    };
    if let Err(rule) = check_endpoint(url, policy) {
        return Err(GuardError::UnsafeEndpoint(rule));
    }
    SecureClient::with_default_transport()?
        .send(&request, policy, retry, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lmguard_kernel::{EndpointRejection, TransportError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn send(&self, _request: &OutboundRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::new(200, "ok"))
        }
    }

    #[tokio::test]
    async fn rejected_endpoint_never_reaches_transport() {
        let transport = Arc::new(CountingTransport::default());
        let client = SecureClient::new(transport.clone());
        let policy = TrustPolicy::strict().with_remote_servers(true);

        let err = client
            .send(
                &OutboundRequest::get("http://169.254.169.254/latest/meta-data"),
                &policy,
                &RetryPolicy::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GuardError::UnsafeEndpoint(EndpointRejection::MetadataHost)
        ));
        assert!(err.is_rejection());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_endpoint_is_fetched() {
        let transport = Arc::new(CountingTransport::default());
        let client = SecureClient::new(transport.clone());

        let response = client
            .send(
                &OutboundRequest::get("http://localhost:1234/v1/models"),
                &TrustPolicy::strict(),
                &RetryPolicy::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.text(), "ok");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn policy_is_read_per_call() {
        let transport = Arc::new(CountingTransport::default());
        let client = SecureClient::new(transport.clone());
        let req = OutboundRequest::get("https://llm.example.com/v1/models");
        let cancel = CancellationToken::new();
        let retry = RetryPolicy::default();

        let strict = TrustPolicy::strict();
        assert!(client.send(&req, &strict, &retry, &cancel).await.is_err());

        let opened = strict.with_remote_servers(true);
        assert!(client.send(&req, &opened, &retry, &cancel).await.is_ok());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn facade_rejects_before_building_a_client() {
        let err = secure_request(
            "ftp://127.0.0.1/file",
            OutboundRequest::get(""),
            &TrustPolicy::relaxed(),
            &RetryPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GuardError::UnsafeEndpoint(EndpointRejection::Scheme)));
    }
}

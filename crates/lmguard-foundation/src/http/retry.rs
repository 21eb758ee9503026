//! Timeout-bounded outbound calls with exponential backoff.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! ATTEMPT ──transport ok (any status)──────────────▶ DONE
//! ATTEMPT ──transient failure, retries left──▶ BACKOFF ──▶ ATTEMPT
//! ATTEMPT ──transient failure, none left / fatal───▶ FAILED
//! ```
//!
//! The only suspension points are the per-attempt network wait (bounded by
//! `timeout_ms`) and the backoff sleep (bounded by the schedule). Both race
//! the caller's [`CancellationToken`].

use lmguard_kernel::{
    GuardError, GuardResult, HttpResponse, HttpTransport, OutboundRequest, RetryPolicy,
    TransportError,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

enum FetchState {
    Attempt { attempt: u32 },
    Backoff { retry: u32 },
    Done(HttpResponse),
    Failed(GuardError),
}

enum AttemptFailure {
    Transient(GuardError),
    Fatal(GuardError),
}

/// Runs requests through an [`HttpTransport`] under a [`RetryPolicy`].
///
/// Status codes are never inspected: a 500 ends the loop exactly like a 200.
#[derive(Clone)]
pub struct ResilientFetch {
    transport: Arc<dyn HttpTransport>,
}

impl ResilientFetch {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    pub async fn execute(
        &self,
        request: &OutboundRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> GuardResult<HttpResponse> {
        let max_attempts = policy.max_attempts();
        let host = host_of(&request.url);
        let mut state = FetchState::Attempt { attempt: 1 };

        loop {
            state = match state {
                FetchState::Attempt { attempt } => {
                    let span = info_span!(
                        "http.attempt",
                        attempt,
                        max_attempts,
                        method = request.method.as_str(),
                        host = %host,
                    );
                    match self.attempt(request, policy, cancel).instrument(span).await {
                        Ok(response) => {
                            if attempt > 1 {
                                info!(%host, attempt, "request succeeded after retry");
                            }
                            FetchState::Done(response)
                        }
                        Err(AttemptFailure::Transient(error)) if attempt < max_attempts => {
                            warn!(
                                %host,
                                attempt,
                                max_attempts,
                                %error,
                                "transport failure, retrying"
                            );
                            FetchState::Backoff { retry: attempt }
                        }
                        Err(AttemptFailure::Transient(error)) => {
                            if max_attempts > 1 {
                                warn!(
                                    %host,
                                    attempts = attempt,
                                    %error,
                                    "request failed after retries"
                                );
                            }
                            FetchState::Failed(error)
                        }
                        Err(AttemptFailure::Fatal(error)) => FetchState::Failed(error),
                    }
                }
                FetchState::Backoff { retry } => {
                    let delay = policy.backoff_delay(retry);
                    debug!(%host, retry, delay_ms = delay.as_millis() as u64, "backing off");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => FetchState::Failed(GuardError::Cancelled),
                        _ = tokio::time::sleep(delay) => FetchState::Attempt { attempt: retry + 1 },
                    }
                }
                FetchState::Done(response) => return Ok(response),
                FetchState::Failed(error) => return Err(error),
            };
        }
    }

    async fn attempt(
        &self,
        request: &OutboundRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, AttemptFailure> {
        let timeout_ms = policy.timeout_ms;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AttemptFailure::Fatal(GuardError::Cancelled)),
            outcome = tokio::time::timeout(policy.timeout(), self.transport.send(request)) => {
                match outcome {
                    Ok(Ok(response)) => {
                        debug!(status = response.status, "response received");
                        Ok(response)
                    }
                    Ok(Err(TransportError::Timeout(_))) | Err(_) => {
                        Err(AttemptFailure::Transient(GuardError::Timeout { timeout_ms }))
                    }
                    Ok(Err(err)) if err.is_transient() => {
                        Err(AttemptFailure::Transient(GuardError::Network(err.to_string())))
                    }
                    Ok(Err(err)) => {
                        Err(AttemptFailure::Fatal(GuardError::Network(err.to_string())))
                    }
                }
            }
        }
    }
}

/// Host part of a URL for logs. Paths and query strings are never logged.
fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::time::Instant;

    enum Step {
        Respond(u16),
        Fail(TransportError),
        Hang,
    }

    struct ScriptedTransport {
        script: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, _request: &OutboundRequest) -> Result<HttpResponse, TransportError> {
            self.calls.lock().push(Instant::now());
            let step = self.script.lock().pop_front();
            match step {
                Some(Step::Respond(status)) => Ok(HttpResponse::new(status, "{}")),
                Some(Step::Fail(err)) => Err(err),
                Some(Step::Hang) => std::future::pending().await,
                None => Err(TransportError::Connect("script exhausted".into())),
            }
        }
    }

    fn refused() -> Step {
        Step::Fail(TransportError::Connect("connection refused".into()))
    }

    fn request() -> OutboundRequest {
        OutboundRequest::get("http://localhost:1234/v1/models")
    }

    fn gaps(times: &[Instant]) -> Vec<Duration> {
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn connection_refused_retries_with_doubling_backoff() {
        let transport = ScriptedTransport::new(vec![refused(), refused(), refused(), refused()]);
        let fetch = ResilientFetch::new(transport.clone());
        let started = Instant::now();

        let result = fetch
            .execute(&request(), &RetryPolicy::new(1_000, 3), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(GuardError::Network(_))));
        let calls = transport.call_times();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            gaps(&calls),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn http_status_is_never_retried() {
        let transport = ScriptedTransport::new(vec![Step::Respond(500), Step::Respond(200)]);
        let fetch = ResilientFetch::new(transport.clone());

        let response = fetch
            .execute(&request(), &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let transport = ScriptedTransport::new(vec![refused(), Step::Respond(200)]);
        let fetch = ResilientFetch::new(transport.clone());

        let response = fetch
            .execute(&request(), &RetryPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempts_time_out_and_surface_timeout_error() {
        let transport = ScriptedTransport::new(vec![Step::Hang, Step::Hang]);
        let fetch = ResilientFetch::new(transport.clone());
        let started = Instant::now();

        let result = fetch
            .execute(&request(), &RetryPolicy::new(500, 1), &CancellationToken::new())
            .await;

        match result {
            Err(GuardError::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 500),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(transport.call_times().len(), 2);
        // 500ms attempt + 1s backoff + 500ms attempt
        assert_eq!(started.elapsed(), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn request_errors_fail_without_retry() {
        let transport = ScriptedTransport::new(vec![Step::Fail(TransportError::Request(
            "bad header".into(),
        ))]);
        let fetch = ResilientFetch::new(transport.clone());

        let result = fetch
            .execute(&request(), &RetryPolicy::default(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(GuardError::Network(_))));
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let transport = ScriptedTransport::new(vec![refused(), Step::Respond(200)]);
        let fetch = ResilientFetch::new(transport.clone());

        let result = fetch
            .execute(&request(), &RetryPolicy::no_retry(1_000), &CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert_eq!(transport.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_skips_pending_backoff() {
        let transport = ScriptedTransport::new(vec![refused(), refused(), refused(), refused()]);
        let fetch = ResilientFetch::new(transport.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1_500)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let result = fetch
            .execute(&request(), &RetryPolicy::new(1_000, 3), &cancel)
            .await;

        assert!(matches!(result, Err(GuardError::Cancelled)));
        // attempts at t=0 and t=1s; the 2s backoff is cut short
        assert_eq!(transport.call_times().len(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_in_flight_wait() {
        let transport = ScriptedTransport::new(vec![Step::Hang]);
        let fetch = ResilientFetch::new(transport.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = fetch
            .execute(&request(), &RetryPolicy::new(30_000, 3), &cancel)
            .await;

        assert!(matches!(result, Err(GuardError::Cancelled)));
        assert_eq!(transport.call_times().len(), 1);
    }
}

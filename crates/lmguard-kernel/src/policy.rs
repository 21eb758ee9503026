//! Trust and retry policies.
//!
//! Both are immutable snapshots. Callers derive a fresh one from the current
//! settings for every call, so a policy change is visible to the next call
//! without any cache to invalidate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Which outbound destinations may be contacted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPolicy {
    /// When false, every well-formed http/https URL is accepted (relaxed,
    /// loopback-and-LAN-only mode).
    pub strict_validation: bool,
    /// When false under strict validation, only loopback hosts are accepted.
    pub allow_remote_servers: bool,
    /// Optional host allowlist. When non-empty, a remote host must equal an
    /// entry or be a subdomain of one.
    pub trusted_hosts: BTreeSet<String>,
}

impl TrustPolicy {
    /// Relaxed policy: every http/https destination is accepted.
    pub fn relaxed() -> Self {
        Self::default()
    }

    /// Strict policy with remote servers disabled (loopback only).
    pub fn strict() -> Self {
        Self {
            strict_validation: true,
            ..Self::default()
        }
    }

    pub fn with_remote_servers(mut self, allow: bool) -> Self {
        self.allow_remote_servers = allow;
        self
    }

    pub fn with_trusted_host(mut self, host: impl Into<String>) -> Self {
        let host = normalize_host(&host.into());
        if !host.is_empty() {
            self.trusted_hosts.insert(host);
        }
        self
    }

    /// Replace the allowlist from a comma-separated settings value.
    ///
    /// Entries are trimmed and lowercased; empty entries are dropped.
    pub fn with_trusted_hosts_csv(mut self, csv: &str) -> Self {
        self.trusted_hosts = parse_trusted_hosts(csv);
        self
    }
}

/// Split a comma-separated host list into normalized entries.
pub fn parse_trusted_hosts(csv: &str) -> BTreeSet<String> {
    csv.split(',')
        .map(normalize_host)
        .filter(|h| !h.is_empty())
        .collect()
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Timeout and retry budget for one outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Upper bound for a single attempt, in milliseconds. Always > 0.
    pub timeout_ms: u64,
    /// Retries after the initial attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Base of the exponential backoff.
    pub const BACKOFF_BASE_MS: u64 = 1_000;

    /// Build a policy, clamping a zero timeout to the default.
    pub fn new(timeout_ms: u64, max_retries: u32) -> Self {
        Self {
            timeout_ms: if timeout_ms == 0 {
                Self::DEFAULT_TIMEOUT_MS
            } else {
                timeout_ms
            },
            max_retries,
        }
    }

    /// A policy that performs exactly one attempt.
    pub fn no_retry(timeout_ms: u64) -> Self {
        Self::new(timeout_ms, 0)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based): 1s, 2s, 4s, …
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(20);
        Duration::from_millis(Self::BACKOFF_BASE_MS.saturating_mul(1u64 << exponent))
    }

    /// Every backoff delay this policy can incur, in order.
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_retries).map(|retry| self.backoff_delay(retry))
    }

    /// Worst-case wall time: every attempt times out and every backoff runs.
    pub fn worst_case(&self) -> Duration {
        let waits: Duration = self.backoff_schedule().sum();
        self.timeout() * self.max_attempts() + waits
    }
}

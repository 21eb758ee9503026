//! Settings model.
//!
//! Keys follow the external settings store (`security.enableStrictValidation`,
//! `advanced.retryCount`, …). Lowercase aliases accept the same keys after
//! they pass through environment overrides.

use crate::policy::{RetryPolicy, TrustPolicy, parse_trusted_hosts};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `security.*`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    #[serde(rename = "enableStrictValidation", alias = "enablestrictvalidation")]
    pub enable_strict_validation: bool,
    #[serde(rename = "allowRemoteServers", alias = "allowremoteservers")]
    pub allow_remote_servers: bool,
    /// Comma-separated host list.
    #[serde(rename = "trustedHosts", alias = "trustedhosts")]
    pub trusted_hosts: String,
}

/// `server.*`: the inbound HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    #[serde(rename = "requireAuth", alias = "requireauth")]
    pub require_auth: bool,
    /// Active credential. Empty until first run.
    #[serde(rename = "apiKey", alias = "apikey")]
    pub api_key: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 23121,
            require_auth: false,
            api_key: String::new(),
        }
    }
}

/// `advanced.*`
///
/// Signed so that a nonsensical negative value can be read and replaced by
/// the default instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Per-attempt timeout in milliseconds.
    pub timeout: i64,
    #[serde(rename = "retryCount", alias = "retrycount")]
    pub retry_count: i64,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            timeout: RetryPolicy::DEFAULT_TIMEOUT_MS as i64,
            retry_count: RetryPolicy::DEFAULT_MAX_RETRIES as i64,
        }
    }
}

/// Wire dialect spoken by the upstream model server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiFlavor {
    #[default]
    OpenAi,
    LmStudioV1,
    Anthropic,
    Custom,
}

impl ApiFlavor {
    /// Parse a settings value; anything unknown means OpenAI.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "lmstudio-v1" => ApiFlavor::LmStudioV1,
            "anthropic" => ApiFlavor::Anthropic,
            "custom" => ApiFlavor::Custom,
            _ => ApiFlavor::OpenAi,
        }
    }
}

/// `lmstudio.*`: the upstream model server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmStudioSettings {
    pub url: String,
    pub model: String,
    #[serde(rename = "apiVersion", alias = "apiversion")]
    pub api_version: String,
    #[serde(rename = "customEndpoint", alias = "customendpoint")]
    pub custom_endpoint: String,
    #[serde(rename = "contextLength", alias = "contextlength")]
    pub context_length: u32,
    #[serde(rename = "useStatefulChats", alias = "usestatefulchats")]
    pub use_stateful_chats: bool,
    #[serde(rename = "enableMcp", alias = "enablemcp")]
    pub enable_mcp: bool,
}

impl Default for LmStudioSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:1234".to_string(),
            model: String::new(),
            api_version: "openai".to_string(),
            custom_endpoint: String::new(),
            context_length: 0,
            use_stateful_chats: false,
            enable_mcp: false,
        }
    }
}

impl LmStudioSettings {
    pub fn flavor(&self) -> ApiFlavor {
        ApiFlavor::parse(&self.api_version)
    }

    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// `features.*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    #[serde(rename = "maxTokens", alias = "maxtokens")]
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Complete settings snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    pub security: SecuritySettings,
    pub server: ServerSettings,
    pub advanced: AdvancedSettings,
    pub lmstudio: LmStudioSettings,
    pub features: FeatureSettings,
}

impl GuardSettings {
    /// Trust policy derived from this snapshot.
    pub fn trust_policy(&self) -> TrustPolicy {
        TrustPolicy {
            strict_validation: self.security.enable_strict_validation,
            allow_remote_servers: self.security.allow_remote_servers,
            trusted_hosts: parse_trusted_hosts(&self.security.trusted_hosts),
        }
    }

    /// Retry policy derived from this snapshot. A zero or negative timeout or
    /// retry count falls back to the default, so `retryCount: 0` still means
    /// three retries. Use [`RetryPolicy::no_retry`] for a single attempt.
    pub fn retry_policy(&self) -> RetryPolicy {
        let timeout_ms = u64::try_from(self.advanced.timeout)
            .ok()
            .filter(|t| *t > 0)
            .unwrap_or(RetryPolicy::DEFAULT_TIMEOUT_MS);
        let max_retries = u32::try_from(self.advanced.retry_count)
            .ok()
            .filter(|r| *r > 0)
            .unwrap_or(RetryPolicy::DEFAULT_MAX_RETRIES);
        RetryPolicy::new(timeout_ms, max_retries)
    }
}

/// Mutable settings owned by a collaborator.
///
/// Readers take a fresh [`GuardSettings`] snapshot per call; a write is
/// visible to every snapshot taken after it.
pub trait SettingsStore: Send + Sync {
    fn snapshot(&self) -> GuardSettings;

    /// Persist a newly generated or rotated credential.
    fn set_api_key(&self, key: &str);
}

/// In-process single-writer, many-reader settings store.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<GuardSettings>>,
}

impl SharedSettings {
    pub fn new(settings: GuardSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Apply an in-place edit.
    pub fn update(&self, edit: impl FnOnce(&mut GuardSettings)) {
        edit(&mut self.inner.write());
    }
}

impl SettingsStore for SharedSettings {
    fn snapshot(&self) -> GuardSettings {
        self.inner.read().clone()
    }

    fn set_api_key(&self, key: &str) {
        self.inner.write().server.api_key = key.to_string();
    }
}

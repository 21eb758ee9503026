//! Outbound HTTP transport contract.
//!
//! [`HttpTransport`] is the seam between the resilient fetch loop and the
//! network. The reqwest implementation lives in `lmguard-foundation`; tests
//! substitute scripted transports.

use crate::error::GuardError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request about to leave the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url).with_header("accept", "application/json")
    }

    /// `POST` with a JSON body.
    pub fn post_json(url: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, url)
            .with_header("content-type", "application/json")
            .with_header("accept", "application/json")
            .with_body(Bytes::from(body.to_string()))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A fully-read upstream response. Any status code counts as a transport
/// success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GuardError> {
        serde_json::from_slice(&self.body).map_err(|e| GuardError::Decode(e.to_string()))
    }

    /// Treat a non-2xx status as fatal.
    pub fn error_for_status(self) -> Result<Self, GuardError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(GuardError::Http {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Transport-level failure of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure, reset.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport's own deadline elapsed.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The connection dropped while the body was being read.
    #[error("body read failed: {0}")]
    Body(String),

    /// The request could not be built (bad header, bad url). Not retried.
    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Request(_))
    }
}

/// Issues one HTTP exchange. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<HttpResponse, TransportError>;
}

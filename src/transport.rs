//! HTTP transport seam
//!
//! The protocol layer only decides what a request looks like and how a
//! response is interpreted. Sending bytes over the wire is delegated to a
//! `Transport`, so tests can record requests without a server.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{SesameError, SesameResult};

/// A fully-built outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: Method,
    /// Absolute URL, query string already encoded
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Request body, if any
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Set the `Accept` header
    pub fn accept(self, mime: &str) -> Self {
        self.header("Accept", mime)
    }

    /// Set the body together with its `Content-Type`
    pub fn body(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body.into());
        self
    }

    /// Set a body with no `Content-Type`
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of a header, compared case-insensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase
    pub reason: String,
    /// Body bytes exactly as received
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8
    pub fn text(&self) -> SesameResult<String> {
        String::from_utf8(self.body.to_vec()).map_err(|_| {
            SesameError::UnexpectedResponse(format!("HTTP {} body is not valid UTF-8", self.status))
        })
    }

    /// Turn the response into a protocol error. The body is kept for
    /// diagnostics, with invalid UTF-8 replaced.
    pub fn into_error(self) -> SesameError {
        SesameError::Protocol {
            status: self.status,
            reason: self.reason,
            body: String::from_utf8_lossy(&self.body).into_owned(),
        }
    }

    /// Return the raw body if the status is `expected`, otherwise a protocol error
    pub fn expect_status(self, expected: u16) -> SesameResult<Bytes> {
        if self.status == expected {
            Ok(self.body)
        } else {
            Err(self.into_error())
        }
    }
}

/// Sends requests and returns responses. Non-success statuses are *not*
/// errors at this level; only transport failures are.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request/response exchange
    async fn execute(&self, request: HttpRequest) -> SesameResult<HttpResponse>;
}

/// Transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from client configuration
    pub fn new(config: &ClientConfig) -> SesameResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SesameError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest::Client`
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> SesameResult<HttpResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!("-> {}", status);

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

//! The seam between the fetcher and the actual HTTP stack.

use crate::error::{NetError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scout_core::NetworkConfig;
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP methods the modules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
        }
    }
}

/// One outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// GET request for `url`.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            timeout: None,
            headers: Vec::new(),
        }
    }

    /// HEAD request for `url`.
    #[must_use]
    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            ..Self::get(url)
        }
    }

    /// Set a per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    /// Response headers, lower-cased names
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the accepted 2xx/3xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// Body as UTF-8, `None` if it is not valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| NetError::Decoding(format!("{}: {e}", self.url)))
    }
}

/// Issues a single HTTP request with no retry or pacing of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response for any status code.
    ///
    /// # Errors
    /// Returns [`NetError::Transport`] when no response was received.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client carrying the configured user agent and timeouts.
    ///
    /// # Errors
    /// Returns [`NetError::Client`] if the TLS backend cannot be initialised.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(network.user_agent.clone())
            .connect_timeout(network.connect_timeout())
            .timeout(network.total_timeout())
            .build()
            .map_err(|e| NetError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = url::Url::parse(&request.url)
            .map_err(|_| NetError::InvalidUrl(request.url.clone()))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Head => self.client.head(url),
        };
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| NetError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}

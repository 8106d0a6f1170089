//! HTTP client for fetching product pages and images
//!
//! One request at a time, no retries. Each resource kind gets its own timeout
//! and every failure is reported as a [`FetchError`] carrying the URL.

#![allow(clippy::uninlined_format_args)]

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, redirect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// What is being fetched, which decides the timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Page,
    Image,
}

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// Non-2xx response
    Status(u16),
    Timeout,
    /// Connection, DNS, TLS or malformed URL
    Transport(String),
    /// Response body could not be read
    Body(String),
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(reason) => write!(f, "transport error: {}", reason),
            Self::Body(reason) => write!(f, "failed to read body: {}", reason),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchCause) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }

    fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let cause = if error.is_timeout() {
            FetchCause::Timeout
        } else if let Some(status) = error.status() {
            FetchCause::Status(status.as_u16())
        } else {
            FetchCause::Transport(error.to_string())
        };
        Self::new(url, cause)
    }
}

/// Source of remote bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the whole body
    async fn fetch(&self, url: &str, kind: ResourceKind) -> Result<Vec<u8>, FetchError>;

    /// GET a page as text; sources without charset metadata are read as UTF-8
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let body = self.fetch(url, ResourceKind::Page).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, url: &str, kind: ResourceKind) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url, kind).await
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch_page(url).await
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub page_timeout_seconds: u64,
    pub image_timeout_seconds: u64,
    /// Pause between catalog entries
    pub delay_ms: u64,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            page_timeout_seconds: 10,
            image_timeout_seconds: 30,
            delay_ms: 1000,
            follow_redirects: true,
        }
    }
}

impl HttpClientConfig {
    pub fn timeout_for(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::Page => Duration::from_secs(self.page_timeout_seconds),
            ResourceKind::Image => Duration::from_secs(self.image_timeout_seconds),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// reqwest-backed [`Fetcher`]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with the given configuration
    pub fn with_config(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                redirect::Policy::limited(10)
            } else {
                redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl HttpClient {
    /// Send the GET and reject non-2xx responses
    async fn send(&self, url: &str, kind: ResourceKind) -> Result<Response, FetchError> {
        tracing::debug!("Fetching {:?}: {}", kind, url);

        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout_for(kind))
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, FetchCause::Status(status.as_u16())));
        }
        Ok(response)
    }
}

fn body_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::new(url, FetchCause::Timeout)
    } else {
        FetchError::new(url, FetchCause::Body(error.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str, kind: ResourceKind) -> Result<Vec<u8>, FetchError> {
        let response = self.send(url, kind).await?;
        let body = response.bytes().await.map_err(|e| body_error(url, &e))?;

        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }

    /// Decodes with the `Content-Type` charset, UTF-8 when none is given
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url, ResourceKind::Page).await?;
        let text = response.text().await.map_err(|e| body_error(url, &e))?;

        tracing::debug!("Fetched {} ({} chars)", url, text.chars().count());
        Ok(text)
    }
}

//! HTTP page fetcher with per-request timeout and retry on transient statuses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::ScraperConfig;
use crate::error::PipelineError;
use crate::retry::{retry_if, RetryConfig};

/// Statuses that are worth another attempt after backing off
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Source of raw page bodies
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a page. Transient failures are retried internally; the error is
    /// always `PipelineError::FetchFailed`.
    async fn get(&self, url: &str) -> Result<String, PipelineError>;
}

/// Outcome of a single request attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    Status(u16),
    Transport { message: String, retryable: bool },
}

impl RequestError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Status(status) => is_retryable_status(*status),
            RequestError::Transport { retryable, .. } => *retryable,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        RequestError::Transport {
            retryable: e.is_timeout() || e.is_connect() || e.is_request(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Status(status) => write!(f, "HTTP {}", status),
            RequestError::Transport { message, .. } => f.write_str(message),
        }
    }
}

/// One-shot GET without retries
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_once(&self, url: &str) -> Result<String, RequestError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get_once(&self, url: &str) -> Result<String, RequestError> {
        (**self).get_once(url).await
    }
}

/// reqwest client with timeout and user agent applied
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_once(&self, url: &str) -> Result<String, RequestError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Fetcher that retries transient failures with exponential backoff
pub struct HttpFetcher<T = ReqwestTransport> {
    transport: T,
    retry: RetryConfig,
}

impl HttpFetcher<ReqwestTransport> {
    pub fn new(config: &ScraperConfig, retry: RetryConfig) -> Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new(config)?, retry))
    }
}

impl<T: Transport> HttpFetcher<T> {
    pub fn with_transport(transport: T, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }
}

#[async_trait]
impl<T: Transport> Fetcher for HttpFetcher<T> {
    async fn get(&self, url: &str) -> Result<String, PipelineError> {
        retry_if(
            &self.retry,
            url,
            || self.transport.get_once(url),
            RequestError::is_retryable,
        )
        .await
        .map_err(|e| PipelineError::FetchFailed {
            url: url.to_string(),
            attempts: e.attempts,
            reason: e.error.to_string(),
        })
    }
}

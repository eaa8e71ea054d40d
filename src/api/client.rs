//! Retry-capable HTTP client for the Staycache REST API.
//!
//! This module provides the `ApiClient` struct plus the `Transport`
//! trait it sends through. `ApiClient` owns the retry policy: bounded
//! exponential backoff over transient failures, with non-retryable
//! responses handed straight back to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Response statuses worth retrying: request timeout, rate limiting,
/// and transient upstream failures.
const RETRY_STATUS: [u16; 6] = [408, 429, 500, 502, 503, 504];

// ============================================================================
// Request / response types
// ============================================================================

/// One HTTP request as the transport sees it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

impl ApiRequest {
    /// Attach a bearer token for authenticated endpoints.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Attach a JSON body (sent with the matching content type).
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A completed exchange: status plus the raw body bytes. Bodies are
/// fully buffered before the response is handed back, so reading them
/// here is infallible.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Seam between the retry layer and the network. Production code goes
/// through [`ReqwestTransport`]; tests script their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single attempt. A timeout must cancel the underlying
    /// request and surface as [`ApiError::Timeout`].
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport over reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);
        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(request.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the Staycache backend.
/// Clone is cheap - the transport is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl ApiClient {
    /// Create a client with the production transport.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Create a client over an injected transport - the seam tests use.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
        }
    }

    /// Build a request against the configured base URL with the client's
    /// default timeout.
    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            bearer: None,
            body: None,
            timeout: self.timeout,
        }
    }

    /// Send a request, retrying transport failures and transient statuses
    /// with exponential backoff (500ms, 1s, 2s, ...). The final attempt's
    /// outcome is returned as-is: an exhausted transport error is
    /// re-thrown, an exhausted bad-status response goes back for the
    /// caller to inspect. Non-retryable statuses return on the first
    /// attempt without delay.
    pub async fn send_with_retry(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut attempt: u32 = 0;

        loop {
            match self.transport.send(request).await {
                Ok(response) => {
                    if !response.is_success()
                        && Self::is_retryable_status(response.status)
                        && attempt < self.max_retries
                    {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            url = %request.url,
                            status = %response.status,
                            delay_ms = delay.as_millis() as u64,
                            "Transient failure status, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        url = %request.url,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Issue a GET and parse the JSON body, converting any non-success
    /// status left after retries into an error carrying the response
    /// body text.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(self.request(Method::GET, path)).await
    }

    /// Run a prepared request through the retry wrapper and parse JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let response = self.send_with_retry(&request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }
        debug!(url = %request.url, status = %response.status, "Response received");
        response.json()
    }

    /// Backoff before retry attempt `n` (0-indexed): base * 2^n.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.pow(attempt)
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        RETRY_STATUS.contains(&status.as_u16())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Scripted transport for exercising the client without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;

use super::client::{ApiRequest, ApiResponse, Transport};
use super::error::ApiError;

/// Canned outcome for one attempt.
pub type ScriptedOutcome = Result<ApiResponse, ApiError>;

/// Serves one scripted outcome per attempt, in order, and panics when
/// the script runs dry so an unexpected extra request fails the test
/// loudly. An optional per-attempt delay holds a request open, which
/// lets single-flight tests pile concurrent callers onto one fetch.
pub struct ScriptedTransport {
    script: Mutex<Vec<ScriptedOutcome>>,
    requests: Mutex<Vec<ApiRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of attempts made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request seen, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.script.lock();
        assert!(
            !script.is_empty(),
            "transport script exhausted by {} {}",
            request.method,
            request.url
        );
        script.remove(0)
    }
}

/// A response with the given status and body text.
pub fn status_response(status: u16, body: &str) -> ScriptedOutcome {
    Ok(ApiResponse {
        status: StatusCode::from_u16(status).expect("valid status"),
        body: Bytes::from(body.to_string()),
    })
}

/// A transport-level failure.
pub fn net_err(message: &str) -> ScriptedOutcome {
    Err(ApiError::Network(message.to_string()))
}

//! Mock scan transport for testing
//!
//! Replays queued responses without touching the network and records every
//! call so tests can assert on call counts and submitted bodies.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::models::{Endpoint, RawResponse};
use super::ScanTransport;
use crate::error::{Error, Result};

/// A call observed by the mock
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub endpoint: Endpoint,
    pub body: serde_json::Value,
}

/// Mock transport for testing.
///
/// # Example
/// ```ignore
/// let mock = MockScanTransport::new().with_response(json!({"scan_id": "abc"}));
/// let raw = mock.send(Endpoint::SyncScan, &body).await?;
/// assert_eq!(mock.call_count().await, 1);
/// ```
#[derive(Clone, Default)]
pub struct MockScanTransport {
    /// Responses returned in order; errors are consumed the same way
    responses: Arc<StdMutex<VecDeque<Result<RawResponse>>>>,
    /// Captured calls for test assertions
    calls: Arc<Mutex<Vec<CapturedCall>>>,
}

impl MockScanTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with the given body
    pub fn with_response(self, body: serde_json::Value) -> Self {
        self.push(Ok(RawResponse { status: 200, body }));
        self
    }

    /// Queue an error
    pub fn with_error(self, err: impl Into<Error>) -> Self {
        self.push(Err(err.into()));
        self
    }

    fn push(&self, item: Result<RawResponse>) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(item);
    }

    /// Responses queued but not yet consumed
    pub fn pending(&self) -> usize {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .len()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ScanTransport for MockScanTransport {
    async fn send(&self, endpoint: Endpoint, body: &serde_json::Value) -> Result<RawResponse> {
        self.calls.lock().await.push(CapturedCall {
            endpoint,
            body: body.clone(),
        });

        let next = self
            .responses
            .lock()
            .expect("mock response queue poisoned")
            .pop_front();
        next.unwrap_or_else(|| {
            Err(Error::Io(std::io::Error::other(
                "MockScanTransport has no queued response",
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queued_responses_survive_clones() {
        let mock = MockScanTransport::new().with_response(json!({"n": 1}));
        let shared = mock.clone();
        let mock = mock.with_response(json!({"n": 2}));
        assert_eq!(shared.pending(), 2);

        let first = shared.send(Endpoint::SyncScan, &json!({})).await.unwrap();
        let second = mock.send(Endpoint::SyncScan, &json!({})).await.unwrap();
        assert_eq!(first.body["n"], 1);
        assert_eq!(second.body["n"], 2);
        assert!(shared.send(Endpoint::SyncScan, &json!({})).await.is_err());
        assert_eq!(mock.call_count().await, 3);
    }
}

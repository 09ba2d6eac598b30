//! Prisma AIRS API client

use async_trait::async_trait;

use crate::error::Result;

pub mod airs;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod retry;
pub mod tls;

pub use airs::AirsClient;
#[cfg(test)]
pub use mock::MockScanTransport;
pub use models::{Endpoint, RawResponse};

/// Transport to the scanning service.
///
/// Implementations own authentication, timeouts and retries; callers only
/// see the final response or a single error.
#[async_trait]
pub trait ScanTransport: Send + Sync {
    /// POST a JSON body to an endpoint and return the parsed success body.
    async fn send(&self, endpoint: Endpoint, body: &serde_json::Value) -> Result<RawResponse>;
}

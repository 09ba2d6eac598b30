//! Wire models for the AIRS scan API

use std::collections::BTreeMap;

use serde::Serialize;

/// Maximum scan objects accepted in one batch submission
pub const MAX_BATCH_SCAN_OBJECTS: usize = 5;

/// Maximum scan ids accepted in one result lookup
pub const MAX_SCAN_IDS: usize = 20;

/// Upstream endpoints the bridge submits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Synchronous single scan
    SyncScan,
    /// Asynchronous batch submission
    AsyncScan,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::SyncScan => "/v1/scan/sync/request",
            Endpoint::AsyncScan => "/v1/scan/async/request",
        }
    }
}

/// AI security profile reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiProfile {
    pub profile_name: String,
}

/// One prompt/response pair to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanContent {
    pub prompt: String,
    pub response: String,
}

/// Single scan request, serialized as the upstream `ScanRequest` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRequest {
    /// Transaction id correlating this request with its result
    pub tr_id: String,

    pub ai_profile: AiProfile,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    pub contents: Vec<ScanContent>,
}

#[cfg(test)]
impl ScanRequest {
    pub fn prompt(&self) -> &str {
        self.contents.first().map_or("", |c| c.prompt.as_str())
    }

    pub fn response(&self) -> &str {
        self.contents.first().map_or("", |c| c.response.as_str())
    }

    pub fn profile(&self) -> &str {
        &self.ai_profile.profile_name
    }
}

/// One entry of an async batch submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchScanObject {
    /// Position in the submitted batch; upstream requires an integer
    pub req_id: usize,

    pub scan_req: ScanRequest,
}

/// Batch of 1..=5 scan requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequest {
    pub scan_objects: Vec<BatchScanObject>,
}

impl BatchRequest {
    pub fn len(&self) -> usize {
        self.scan_objects.len()
    }
}

/// Successful HTTP response body, not yet interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

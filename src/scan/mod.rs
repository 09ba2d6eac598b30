//! Scan operations: shape, submit, translate

use std::sync::Arc;

use log::debug;

use crate::client::models::{Endpoint, MAX_SCAN_IDS};
use crate::client::ScanTransport;
use crate::error::{Error, Result};

pub mod shaper;
pub mod verdict;

pub use shaper::{RequestShaper, ScanPair, check_batch_size, validate_scan_ids};
pub use verdict::{BatchReceipt, ScanResult};

/// The bridge's scan operations, independent of the tool protocol.
///
/// Holds no mutable state; safe to share across concurrent calls.
pub struct ScanService {
    transport: Arc<dyn ScanTransport>,
    shaper: RequestShaper,
}

impl ScanService {
    pub fn new(transport: Arc<dyn ScanTransport>, shaper: RequestShaper) -> Self {
        Self { transport, shaper }
    }

    /// Scan one prompt/response pair synchronously.
    pub async fn scan_single(
        &self,
        prompt: Option<&str>,
        response: Option<&str>,
    ) -> Result<ScanResult> {
        let request = self.shaper.build_single(prompt, response)?;
        debug!("Submitting sync scan tr_id={}", request.tr_id);

        let body = serde_json::to_value(&request)?;
        let raw = self.transport.send(Endpoint::SyncScan, &body).await?;
        verdict::translate(&raw)
    }

    /// Submit up to five pairs for asynchronous scanning.
    pub async fn scan_batch(&self, pairs: &[ScanPair]) -> Result<BatchReceipt> {
        let batch = self.shaper.build_batch(pairs)?;
        debug!("Submitting async batch of {} scan object(s)", batch.len());

        let body = serde_json::to_value(&batch)?;
        let raw = self.transport.send(Endpoint::AsyncScan, &body).await?;
        verdict::translate_batch(&raw, batch.len())
    }

    /// Look up results for up to twenty scan ids.
    ///
    /// The service exposes no result retrieval endpoint yet, so any request
    /// within the bound ends in `Error::Unimplemented`.
    pub async fn get_results(&self, scan_ids: &[String]) -> Result<Vec<ScanResult>> {
        validate_scan_ids(scan_ids, MAX_SCAN_IDS)?;
        Err(Error::Unimplemented {
            operation: "scan result retrieval",
        })
    }

    /// Fetch detailed threat reports. Unbounded, same contract as `get_results`.
    pub async fn get_reports(&self, scan_ids: &[String]) -> Result<Vec<serde_json::Value>> {
        debug!("Report lookup requested for {} scan id(s)", scan_ids.len());
        Err(Error::Unimplemented {
            operation: "scan report retrieval",
        })
    }
}

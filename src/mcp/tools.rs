//! Tool catalog and argument shapes

use serde::Deserialize;
use serde_json::json;

use super::protocol::ToolDefinition;
use crate::client::models::{MAX_BATCH_SCAN_OBJECTS, MAX_SCAN_IDS};

pub const INLINE_SCAN: &str = "pan_inline_scan";
pub const BATCH_SCAN: &str = "pan_batch_scan";
pub const GET_SCAN_RESULTS: &str = "pan_get_scan_results";
pub const GET_SCAN_REPORTS: &str = "pan_get_scan_reports";

/// Tools the dispatcher routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    InlineScan,
    BatchScan,
    GetScanResults,
    GetScanReports,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            INLINE_SCAN => Some(Tool::InlineScan),
            BATCH_SCAN => Some(Tool::BatchScan),
            GET_SCAN_RESULTS => Some(Tool::GetScanResults),
            GET_SCAN_REPORTS => Some(Tool::GetScanReports),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::InlineScan => INLINE_SCAN,
            Tool::BatchScan => BATCH_SCAN,
            Tool::GetScanResults => GET_SCAN_RESULTS,
            Tool::GetScanReports => GET_SCAN_REPORTS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InlineScanArgs {
    pub prompt: Option<String>,
    pub response: Option<String>,
}

/// Entries stay raw until the batch size has been checked
#[derive(Debug, Deserialize)]
pub struct BatchScanArgs {
    pub scan_objects: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ScanIdsArgs {
    pub scan_ids: Option<Vec<String>>,
}

fn pair_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "prompt": {
                "type": "string",
                "description": "The user's input message to scan"
            },
            "response": {
                "type": "string",
                "description": "The AI's response message to scan"
            }
        },
        "required": ["prompt", "response"]
    })
}

fn scan_ids_schema(max: Option<usize>) -> serde_json::Value {
    let mut ids = json!({
        "type": "array",
        "items": { "type": "string" }
    });
    if let Some(max) = max {
        ids["maxItems"] = json!(max);
    }
    json!({
        "type": "object",
        "properties": { "scan_ids": ids },
        "required": ["scan_ids"]
    })
}

/// Definitions returned from `tools/list`
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: INLINE_SCAN,
            description: "Scan a single prompt/response pair for security threats: prompt \
                          injection, malicious code, data exfiltration, toxic content and policy \
                          violations. Returns scan_id, verdict (benign|malicious), action \
                          (allow|block) and a list of namespaced threat tags.",
            input_schema: pair_schema(),
        },
        ToolDefinition {
            name: BATCH_SCAN,
            description: "Submit up to 5 prompt/response pairs for asynchronous scanning. \
                          Returns the scan_ids for later retrieval and the submitted count.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "scan_objects": {
                        "type": "array",
                        "items": pair_schema(),
                        "minItems": 1,
                        "maxItems": MAX_BATCH_SCAN_OBJECTS
                    }
                },
                "required": ["scan_objects"]
            }),
        },
        ToolDefinition {
            name: GET_SCAN_RESULTS,
            description: "Retrieve scan results for up to 20 scan ids from earlier batch scans. \
                          Not yet backed by the scanning service.",
            input_schema: scan_ids_schema(Some(MAX_SCAN_IDS)),
        },
        ToolDefinition {
            name: GET_SCAN_REPORTS,
            description: "Get detailed threat reports with remediation guidance for scan ids. \
                          Not yet backed by the scanning service.",
            input_schema: scan_ids_schema(None),
        },
    ]
}

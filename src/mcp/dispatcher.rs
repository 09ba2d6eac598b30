//! Routes tool calls to scan operations and wraps outcomes in envelopes
//!
//! Every call ends in exactly one envelope: `{success: true, ...}` with the
//! operation's data, or `{success: false, error, error_kind}`. Only an unknown
//! tool name or non-object arguments become protocol errors.

use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::protocol::{CallToolResult, ContentBlock, ProtocolError};
use super::tools::{BatchScanArgs, InlineScanArgs, ScanIdsArgs, Tool};
use crate::error::{Error, ErrorKind, Result, ValidationError};
use crate::scan::{ScanPair, ScanService, check_batch_size};

/// Message returned for operations the scanning service does not back yet
pub const NOT_IMPLEMENTED: &str = "Not yet implemented";

/// Structured outcome of one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEnvelope {
    pub success: bool,
    pub body: Value,
}

#[derive(Serialize)]
struct Succeeded<'a, T> {
    success: bool,
    #[serde(flatten)]
    data: &'a T,
}

#[derive(Serialize)]
struct Failed<'a> {
    success: bool,
    error: String,
    error_kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl ToolEnvelope {
    fn succeeded<T: Serialize>(data: &T) -> Result<Self> {
        let body = serde_json::to_value(Succeeded {
            success: true,
            data,
        })?;
        Ok(Self {
            success: true,
            body,
        })
    }

    fn failed(err: &Error) -> Self {
        let kind = err.kind();
        let (error, note) = match err {
            Error::Unimplemented { operation } => (
                NOT_IMPLEMENTED.to_string(),
                Some(format!(
                    "{} needs an endpoint the scanning service does not expose yet",
                    operation
                )),
            ),
            other => (other.to_string(), None),
        };

        let failed = Failed {
            success: false,
            error,
            error_kind: kind.as_str(),
            note,
        };
        Self {
            success: false,
            body: serde_json::to_value(failed).unwrap_or_else(|_| {
                serde_json::json!({"success": false, "error": err.to_string()})
            }),
        }
    }

    pub fn into_call_result(self) -> CallToolResult {
        CallToolResult {
            content: vec![ContentBlock {
                kind: "text",
                text: self.body.to_string(),
            }],
            structured_content: self.body,
            is_error: !self.success,
        }
    }
}

/// Tool endpoint router
pub struct ToolDispatcher {
    service: ScanService,
}

impl ToolDispatcher {
    pub fn new(service: ScanService) -> Self {
        Self { service }
    }

    /// Run one tool call end to end.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &Value,
    ) -> std::result::Result<ToolEnvelope, ProtocolError> {
        let tool =
            Tool::from_name(name).ok_or_else(|| ProtocolError::UnknownTool(name.to_string()))?;

        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => arguments.clone(),
            _ => {
                return Err(ProtocolError::InvalidParams(
                    "tool arguments must be a JSON object".to_string(),
                ));
            }
        };

        debug!("{}: received", tool.name());
        let started = Instant::now();

        let envelope = match self.run(tool, arguments).await {
            Ok(envelope) => {
                info!(
                    "{}: succeeded in {}ms",
                    tool.name(),
                    started.elapsed().as_millis()
                );
                envelope
            }
            Err(err) => {
                match err.kind() {
                    ErrorKind::Validation | ErrorKind::Unimplemented => {
                        info!("{}: {}", tool.name(), err)
                    }
                    _ => warn!(
                        "{}: failed in {}ms: {}",
                        tool.name(),
                        started.elapsed().as_millis(),
                        err
                    ),
                }
                ToolEnvelope::failed(&err)
            }
        };

        Ok(envelope)
    }

    async fn run(&self, tool: Tool, arguments: Value) -> Result<ToolEnvelope> {
        match tool {
            Tool::InlineScan => {
                let args: InlineScanArgs = parse_args(tool, arguments)?;
                debug!("{}: validated, dispatching", tool.name());
                let result = self
                    .service
                    .scan_single(args.prompt.as_deref(), args.response.as_deref())
                    .await?;
                ToolEnvelope::succeeded(&result)
            }
            Tool::BatchScan => {
                let args: BatchScanArgs = parse_args(tool, arguments)?;
                let entries = args.scan_objects.ok_or(ValidationError::MissingField {
                    field: "scan_objects",
                })?;
                check_batch_size(entries.len())?;
                let pairs = scan_pairs(tool, entries)?;
                debug!("{}: validated, dispatching", tool.name());
                let receipt = self.service.scan_batch(&pairs).await?;
                ToolEnvelope::succeeded(&receipt)
            }
            Tool::GetScanResults => {
                let scan_ids = scan_ids(tool, arguments)?;
                let results = self.service.get_results(&scan_ids).await?;
                ToolEnvelope::succeeded(&serde_json::json!({ "results": results }))
            }
            Tool::GetScanReports => {
                let scan_ids = scan_ids(tool, arguments)?;
                let reports = self.service.get_reports(&scan_ids).await?;
                ToolEnvelope::succeeded(&serde_json::json!({ "reports": reports }))
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        ValidationError::InvalidArguments(format!("{}: {}", tool.name(), e)).into()
    })
}

fn scan_pairs(tool: Tool, entries: Vec<Value>) -> Result<Vec<ScanPair>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|e| {
                ValidationError::InvalidArguments(format!(
                    "{}: scan_objects[{}]: {}",
                    tool.name(),
                    index,
                    e
                ))
                .into()
            })
        })
        .collect()
}

fn scan_ids(tool: Tool, arguments: Value) -> Result<Vec<String>> {
    let args: ScanIdsArgs = parse_args(tool, arguments)?;
    args.scan_ids
        .ok_or_else(|| ValidationError::MissingField { field: "scan_ids" }.into())
}

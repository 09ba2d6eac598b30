//! Newline-delimited JSON-RPC server over stdio
//!
//! Requests are read line by line. `tools/call` runs on its own task so slow
//! scans never block other calls; responses are written as they complete, so
//! callers correlate by id rather than order.

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;

use super::dispatcher::ToolDispatcher;
use super::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ProtocolError,
    ToolsListResult,
};
use super::tools::tool_definitions;
use crate::error::Result;

pub struct McpServer {
    dispatcher: Arc<ToolDispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Serve until the reader reaches EOF, then drain in-flight calls.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut in_flight: JoinSet<Option<JsonRpcResponse>> = JoinSet::new();

        info!("MCP server listening on stdio");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(response) = self.handle_line(&line, &mut in_flight) {
                        write_response(&mut writer, &response).await?;
                    }
                }
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match done {
                        Ok(Some(response)) => write_response(&mut writer, &response).await?,
                        Ok(None) => {}
                        Err(err) => error!("Tool call task failed: {}", err),
                    }
                }
            }
        }

        debug!("stdin closed, waiting for {} in-flight call(s)", in_flight.len());
        while let Some(done) = in_flight.join_next().await {
            match done {
                Ok(Some(response)) => write_response(&mut writer, &response).await?,
                Ok(None) => {}
                Err(err) => error!("Tool call task failed: {}", err),
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one line; tool calls are queued on `in_flight` instead of answered inline.
    fn handle_line(
        &self,
        line: &str,
        in_flight: &mut JoinSet<Option<JsonRpcResponse>>,
    ) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, e.to_string()),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                JsonRpcError::with_data(
                    JsonRpcError::INVALID_REQUEST,
                    "Invalid JSON-RPC version",
                    json!({"expected": "2.0", "got": request.jsonrpc}),
                ),
            ));
        }

        debug!("<- {} (id {:?})", request.method, request.id);

        if request.method == "tools/call" {
            self.spawn_tool_call(request, in_flight);
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => {
                let requested = request.params.get("protocolVersion").and_then(Value::as_str);
                serde_json::to_value(InitializeResult::for_client(requested))
                    .map_err(|e| ProtocolError::Internal(e.to_string()))
            }
            "ping" => Ok(json!({})),
            "tools/list" => serde_json::to_value(ToolsListResult {
                tools: tool_definitions(),
            })
            .map_err(|e| ProtocolError::Internal(e.to_string())),
            method if method.starts_with("notifications/") => {
                debug!("Notification {} acknowledged", method);
                return None;
            }
            method => Err(ProtocolError::MethodNotFound(method.to_string())),
        };

        let id = request.id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, e.into()),
        })
    }

    fn spawn_tool_call(
        &self,
        request: JsonRpcRequest,
        in_flight: &mut JoinSet<Option<JsonRpcResponse>>,
    ) {
        let dispatcher = Arc::clone(&self.dispatcher);

        in_flight.spawn(async move {
            let id = request.id;
            let outcome = match request.params.get("name").and_then(Value::as_str) {
                Some(name) => {
                    let arguments = request.params.get("arguments").cloned().unwrap_or(Value::Null);
                    dispatcher
                        .dispatch(name, &arguments)
                        .await
                        .and_then(|envelope| {
                            serde_json::to_value(envelope.into_call_result())
                                .map_err(|e| ProtocolError::Internal(e.to_string()))
                        })
                }
                None => Err(ProtocolError::InvalidParams(
                    "missing tool 'name'".to_string(),
                )),
            };

            let id = id?;
            Some(match outcome {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => {
                    warn!("tools/call rejected: {}", e);
                    JsonRpcResponse::error(id, e.into())
                }
            })
        });
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut json = serde_json::to_string(response)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockScanTransport;
    use crate::scan::{RequestShaper, ScanService};

    fn server(mock: &MockScanTransport) -> McpServer {
        McpServer::new(ToolDispatcher::new(ScanService::new(
            Arc::new(mock.clone()),
            RequestShaper::new("default", None),
        )))
    }

    async fn exchange(server: &McpServer, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server.run(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn by_id(responses: &[Value], id: i64) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == json!(id))
            .unwrap_or_else(|| panic!("no response with id {id}"))
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let mock = MockScanTransport::new();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );

        let responses = exchange(&server(&mock), input).await;
        assert_eq!(responses.len(), 2);

        let init = by_id(&responses, 1);
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");

        let tools = by_id(&responses, 2)["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(
            names,
            vec![
                "pan_inline_scan",
                "pan_batch_scan",
                "pan_get_scan_results",
                "pan_get_scan_reports"
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let mock = MockScanTransport::new().with_response(json!({
            "scan_id": "abc",
            "category": "benign",
            "action": "allow"
        }));
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"pan_inline_scan","arguments":{"prompt":"p","response":"r"}}}"#,
            "\n"
        );

        let responses = exchange(&server(&mock), input).await;
        let result = &by_id(&responses, 3)["result"];

        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["scan_id"], "abc");
        assert_eq!(result["structuredContent"]["success"], true);
        let text: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text, result["structuredContent"]);
    }

    #[tokio::test]
    async fn test_concurrent_calls_all_answered() {
        let mock = MockScanTransport::new();
        let input: String = (10..15)
            .map(|id| {
                format!(
                    r#"{{"jsonrpc":"2.0","id":{id},"method":"tools/call","params":{{"name":"pan_get_scan_results","arguments":{{"scan_ids":["s-{id}"]}}}}}}"#
                ) + "\n"
            })
            .collect();

        let responses = exchange(&server(&mock), &input).await;
        assert_eq!(responses.len(), 5);
        for id in 10..15 {
            let envelope = &by_id(&responses, id)["result"]["structuredContent"];
            assert_eq!(envelope["error"], "Not yet implemented");
        }
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let mock = MockScanTransport::new();
        let input = concat!(
            "this is not json\n",
            r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"nope"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            "\n"
        );

        let responses = exchange(&server(&mock), input).await;
        assert_eq!(responses.len(), 5);

        let parse_error = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(parse_error["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(
            by_id(&responses, 4)["error"]["code"],
            JsonRpcError::INVALID_REQUEST
        );
        assert_eq!(
            by_id(&responses, 5)["error"]["code"],
            JsonRpcError::METHOD_NOT_FOUND
        );
        assert_eq!(
            by_id(&responses, 6)["error"]["code"],
            JsonRpcError::INVALID_PARAMS
        );
        assert_eq!(by_id(&responses, 7)["result"], json!({}));
    }
}

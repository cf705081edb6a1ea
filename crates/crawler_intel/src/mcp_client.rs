use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::time::timeout;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

#[derive(Debug, thiserror::Error)]
pub enum McpClientError {
    #[error("write to subprocess stdin failed: {0}")]
    Write(#[source] std::io::Error),
    #[error("read from subprocess stdout failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("subprocess closed stdout before responding")]
    Eof,
    #[error("response was not valid JSON-RPC: {0}")]
    Malformed(String),
    #[error("server returned an error: {0}")]
    ServerError(String),
    #[error("timed out waiting for response after {0:?}")]
    Timeout(Duration),
}

/// MCP-over-stdio client. One instance per collected
/// candidate; newline-delimited JSON-RPC 2.0 requests out, responses in.
pub struct McpClient {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl McpClient {
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
        }
    }

    async fn call(&mut self, method: &str, params: Option<Value>, budget: Duration) -> Result<JsonRpcResponse, McpClientError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = JsonRpcRequest::new(id, method, params);
        let mut line = serde_json::to_string(&request).expect("request serializes");
        line.push('\n');

        timeout(budget, self.stdin.write_all(line.as_bytes()))
            .await
            .map_err(|_| McpClientError::Timeout(budget))?
            .map_err(McpClientError::Write)?;
        self.stdin.flush().await.map_err(McpClientError::Write)?;

        let mut raw = String::new();
        let bytes_read = timeout(budget, self.stdout.read_line(&mut raw))
            .await
            .map_err(|_| McpClientError::Timeout(budget))?
            .map_err(McpClientError::Read)?;
        if bytes_read == 0 {
            return Err(McpClientError::Eof);
        }

        let response: JsonRpcResponse =
            serde_json::from_str(raw.trim()).map_err(|e| McpClientError::Malformed(e.to_string()))?;
        if let Some(error) = &response.error {
            return Err(McpClientError::ServerError(error.message.clone()));
        }
        Ok(response)
    }

    /// `initialize` request. Returns the server's declared
    /// protocol version, opaque to us beyond recording it.
    pub async fn initialize(&mut self, budget: Duration) -> Result<InitializeResult, McpClientError> {
        let params = json!({
            "protocolVersion": crate::protocol::MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "mcp-registry-crawler", "version": env!("CARGO_PKG_VERSION") },
        });
        let response = self.call("initialize", Some(params), budget).await?;
        let result = response.result.unwrap_or(Value::Null);
        Ok(InitializeResult {
            protocol_version: result.get("protocolVersion").and_then(Value::as_str).map(str::to_string),
            capabilities: result
                .get("capabilities")
                .and_then(Value::as_object)
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        })
    }

    /// `tools/list` request.
    pub async fn list_tools(&mut self, budget: Duration) -> Result<Vec<Value>, McpClientError> {
        let response = self.call("tools/list", None, budget).await?;
        Ok(response
            .result
            .and_then(|r| r.get("tools").cloned())
            .and_then(|t| t.as_array().cloned())
            .unwrap_or_default())
    }

    /// `tools/call` with minimal/empty arguments, used to classify a tool as
    /// working or failing.
    pub async fn call_tool(&mut self, name: &str, budget: Duration) -> Result<Value, McpClientError> {
        let params = json!({ "name": name, "arguments": {} });
        let response = self.call("tools/call", Some(params), budget).await?;
        Ok(response.result.unwrap_or(Value::Null))
    }
}

pub struct InitializeResult {
    pub protocol_version: Option<String>,
    pub capabilities: Vec<String>,
}

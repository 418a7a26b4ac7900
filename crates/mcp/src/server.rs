//! MCP server: newline-delimited JSON-RPC 2.0 over a byte stream.
//!
//! Requests are read one line at a time. Everything except `tools/call` is
//! answered inline; each tool call runs on its own task so slow remote
//! completions do not block the reader. All responses go through a single
//! writer task, so lines never interleave.

use crate::protocol::*;
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use glm_core::config::SERVER_NAME;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite, LinesCodec};

/// Default upper bound for a single inbound message.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// In-flight tool calls keyed by the serialized request id.
type InFlight = Arc<Mutex<HashMap<String, AbortHandle>>>;

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
    instructions: Option<String>,
    max_line_bytes: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    /// Cap on the size of one inbound line. A longer line closes the input.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Usage notes returned to the host in the `initialize` result.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn start(&self) -> Result<()> {
        tracing::info!(tools = self.registry.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve on an arbitrary reader/writer pair until the reader reaches EOF.
    ///
    /// In-flight tool calls are allowed to finish and their responses are
    /// flushed before this returns.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut session = Session {
            registry: self.registry.clone(),
            tx,
            tasks: JoinSet::new(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        };

        // Framed on raw bytes so a line that is not UTF-8 is a parse error,
        // not a stream error.
        let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), self.max_line_bytes);
        let mut lines = FramedRead::new(reader, codec);
        while let Some(frame) = lines.next().await {
            match frame {
                Ok(chunk) => {
                    let response = match std::str::from_utf8(&chunk) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => self.handle_line(line, &mut session),
                        Err(e) => {
                            tracing::warn!("Message is not valid UTF-8: {}", e);
                            Some(JsonRpcResponse::error(
                                serde_json::Value::Null,
                                JsonRpcError::parse_error(),
                            ))
                        }
                    };
                    if let Some(response) = response {
                        session.send(response);
                    }
                }
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    // The codec does not resume after a framing error.
                    tracing::error!(limit = self.max_line_bytes, "Oversized message, closing input");
                    session.send(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::invalid_request(format!(
                            "Message exceeds {} bytes",
                            self.max_line_bytes
                        )),
                    ));
                    break;
                }
                Err(AnyDelimiterCodecError::Io(e)) => {
                    tracing::error!("Failed to read from input: {}", e);
                    break;
                }
            }
            session.reap_finished();
        }

        tracing::info!("Input closed, waiting for in-flight tool calls");
        while let Some(joined) = session.tasks.join_next().await {
            log_join_error(joined);
        }

        drop(session);
        writer_task
            .await
            .context("Response writer task failed")?
            .context("Failed to write responses")?;

        tracing::info!("MCP server stopped");
        Ok(())
    }

    fn handle_line(&self, line: &str, session: &mut Session) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse message: {}", e);
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);

        if value.get("method").is_none() {
            if value.get("result").is_some() || value.get("error").is_some() {
                // Responses to requests we never send.
                tracing::debug!(%id, "Ignoring response message");
                return None;
            }
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Message has no method"),
            ));
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                ))
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Unsupported jsonrpc version"),
            ));
        }

        self.handle_request(request, session)
    }

    fn handle_request(&self, request: JsonRpcRequest, session: &mut Session) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, "Received request");

        let Some(id) = request.id else {
            self.handle_notification(&request.method, request.params, session);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => return session.call_tool(id, request.params),
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };

        Some(response)
    }

    fn handle_notification(&self, method: &str, params: Option<serde_json::Value>, session: &mut Session) {
        match method {
            "notifications/initialized" => tracing::info!("Client initialized"),
            "notifications/cancelled" => {
                let params = params.map(serde_json::from_value::<CancelledParams>);
                match params {
                    Some(Ok(params)) => session.cancel(&params),
                    _ => tracing::warn!("Ignoring malformed cancellation"),
                }
            }
            other => tracing::debug!(method = other, "Ignoring notification"),
        }
    }

    fn initialize(&self, id: serde_json::Value, params: Option<serde_json::Value>) -> JsonRpcResponse {
        let params = match params {
            Some(params) => match serde_json::from_value::<InitializeParams>(params) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                    )
                }
            },
            None => InitializeParams::default(),
        };

        let protocol_version = negotiate_protocol_version(&params.protocol_version);
        tracing::info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            requested = %params.protocol_version,
            protocol_version,
            "Initializing session"
        );

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: protocol_version.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability { list_changed: false }),
                },
                server_info: self.server_info.clone(),
                instructions: self.instructions.clone(),
            },
        )
    }
}

/// Per-connection state.
struct Session {
    registry: Arc<ToolRegistry>,
    tx: mpsc::UnboundedSender<JsonRpcResponse>,
    tasks: JoinSet<()>,
    in_flight: InFlight,
}

impl Session {
    fn send(&self, response: JsonRpcResponse) {
        if self.tx.send(response).is_err() {
            tracing::error!("Response writer has stopped; dropping response");
        }
    }

    fn call_tool(&mut self, id: serde_json::Value, params: Option<serde_json::Value>) -> Option<JsonRpcResponse> {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)),
                ))
            }
            None => {
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing tool call params"),
                ))
            }
        };

        if !self.registry.contains(&params.name) {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            ));
        }

        let key = id.to_string();
        // Held across spawn so the task cannot finish before it is tracked.
        let mut in_flight = lock(&self.in_flight);
        if in_flight.contains_key(&key) {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("Request id {} is already in flight", key)),
            ));
        }

        let registry = self.registry.clone();
        let tracked = self.in_flight.clone();
        let tx = self.tx.clone();
        let task_key = key.clone();

        let handle = self.tasks.spawn(async move {
            let response = match registry.call(&params.name, params.arguments).await {
                Some(result) => JsonRpcResponse::success(id, result),
                None => JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
                ),
            };

            // A cancelled call has already been removed; it must not answer.
            if lock(&tracked).remove(&task_key).is_some() && tx.send(response).is_err() {
                tracing::error!("Response writer has stopped; dropping tool result");
            }
        });
        in_flight.insert(key, handle);

        None
    }

    fn cancel(&self, params: &CancelledParams) {
        let key = params.request_id.to_string();
        match lock(&self.in_flight).remove(&key) {
            Some(handle) => {
                handle.abort();
                tracing::info!(
                    request_id = %key,
                    reason = params.reason.as_deref().unwrap_or(""),
                    "Cancelled tool call"
                );
            }
            None => tracing::debug!(request_id = %key, "Cancellation for unknown or finished request"),
        }
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join_error(joined);
        }
    }
}

fn lock(in_flight: &InFlight) -> std::sync::MutexGuard<'_, HashMap<String, AbortHandle>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn log_join_error(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("Tool call task panicked: {}", e);
        }
    }
}

async fn write_responses<W>(writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    while let Some(response) = rx.recv().await {
        let line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        sink.send(line).await.context("Failed to write response")?;
    }
    Ok(())
}

// MCP server: request dispatch plus the stdio and HTTP transports

use crate::protocol::{
    negotiate_version, CallToolParams, CallToolResult, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, ToolsCapability,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "strava-mcp";

/// Longest newline-delimited message accepted by default.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// MCP server dispatching JSON-RPC requests to the registered tools.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    max_message_bytes: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    /// Cap the length of one message on the line-based transport.
    pub fn with_max_message_bytes(mut self, max_message_bytes: usize) -> Self {
        self.max_message_bytes = max_message_bytes;
        self
    }

    /// Handle one raw JSON-RPC message. Returns the serialized response, or
    /// `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(message) {
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON-RPC message");
                Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
            }
            Ok(value) => self.handle_value(value).await,
        }?;

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize JSON-RPC response");
                None
            }
        }
    }

    async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        // A null id would otherwise read as a notification and go unanswered
        if value.get("id").is_some_and(Value::is_null) {
            warn!("Request with a null id");
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC request");
                return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
            }
        };

        if request.jsonrpc != "2.0" {
            warn!(version = %request.jsonrpc, "Unsupported JSON-RPC version");
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        self.handle_request(request).await
    }

    /// Dispatch a parsed request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Received notification");
            return None;
        };

        debug!(method = %request.method, id = %id, "Handling request");

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::from_result(
                id,
                &ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                warn!(method = other, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };

        Some(response)
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        let version = negotiate_version(&params.protocol_version);
        info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            requested = %params.protocol_version,
            negotiated = version,
            "Client initialized"
        );

        JsonRpcResponse::from_result(
            id,
            &InitializeResult {
                protocol_version: version.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(
                    "Tools for reading the authenticated athlete's Strava data. Distances are \
                     in meters, times in seconds and speeds in meters per second."
                        .to_string(),
                ),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match parse_params(params) {
            Ok(params) => params,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        let Some(tool) = self.registry.get(&params.name) else {
            warn!(tool = %params.name, "Unknown tool");
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        info!(tool = %params.name, "Calling tool");
        let result = match tool.execute(params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call rejected");
                CallToolResult::error(format!("{:#}", e))
            }
        };

        JsonRpcResponse::from_result(id, &result)
    }

    /// Serve newline-delimited JSON-RPC over stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        info!(tools = self.registry.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FramedRead::new(reader, MessageCodec::new(self.max_message_bytes));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(frame) = frames.next().await {
            let response = match frame.context("Failed to read from input")? {
                Frame::Line(line) if line.trim().is_empty() => continue,
                Frame::Line(line) => self.handle_message(&line).await,
                Frame::TooLong => {
                    warn!(max_bytes = self.max_message_bytes, "Discarded over-long message");
                    serde_json::to_string(&JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::invalid_request(),
                    ))
                    .ok()
                }
            };

            if let Some(response) = response {
                sink.send(response)
                    .await
                    .context("Failed to write response")?;
            }
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// HTTP router: `POST /mcp` for JSON-RPC messages, `GET /health` for health checks.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(handle_mcp))
            .route("/health", get(health_check))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new())
                    .on_response(DefaultOnResponse::new()),
            )
            .with_state(self.clone())
    }

    /// Serve the HTTP transport on `addr` until the process is interrupted.
    pub async fn serve_http(&self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!(%addr, tools = self.registry.len(), "MCP server listening on HTTP");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// One frame of newline-delimited input.
#[derive(Debug, PartialEq)]
enum Frame {
    Line(String),
    /// A line over the length limit. Its bytes are skipped up to the next newline.
    TooLong,
}

/// `LinesCodec` that reports over-long lines as a frame instead of failing the stream.
struct MessageCodec {
    lines: LinesCodec,
}

impl MessageCodec {
    fn new(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        into_frame(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        into_frame(self.lines.decode_eof(buf))
    }
}

fn into_frame(
    result: Result<Option<String>, LinesCodecError>,
) -> Result<Option<Frame>, LinesCodecError> {
    match result {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::TooLong)),
        Err(e) => Err(e),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

async fn handle_mcp(State(server): State<McpServer>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            response,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

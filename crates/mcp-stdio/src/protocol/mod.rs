//! MCP Protocol Dispatch
//!
//! Routes JSON-RPC methods to a [`Handler`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::types::error::ErrorData;
use crate::types::jsonrpc::JsonRpcMessage;
use crate::types::protocol::{
    negotiate_version, InitializeParams, InitializeResult, Implementation, ServerCapabilities,
};
use crate::types::tool::{CallToolParams, CallToolResult, ListToolsResult, Tool};

/// Handler trait for MCP server implementations.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Return the list of available tools.
    async fn list_tools(&self) -> Result<Vec<Tool>, ErrorData>;

    /// Execute a tool call.
    ///
    /// Failures the model should see belong in [`CallToolResult::error`];
    /// an `Err` becomes a JSON-RPC error response.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData>;

    /// Return server implementation info.
    fn server_info(&self) -> Implementation;

    /// Return instructions for the LLM.
    fn instructions(&self) -> Option<String> {
        None
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::with_tools()
    }
}

/// Dispatch a JSON-RPC request to the handler.
///
/// Creates a span following the OpenTelemetry JSON-RPC semantic conventions.
pub async fn dispatch<H: Handler + ?Sized>(
    handler: &H,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let request_id = message
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let span = tracing::info_span!(
        "mcp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %message.method,
        rpc.jsonrpc.version = "2.0",
        rpc.jsonrpc.request_id = %request_id,
        error.type = tracing::field::Empty,
        rpc.jsonrpc.error_code = tracing::field::Empty,
        rpc.jsonrpc.error_message = tracing::field::Empty,
    );

    async {
        let result = dispatch_inner(handler, message).await;

        if let Err(ref error) = result {
            let span = tracing::Span::current();
            span.record("error.type", error.kind());
            span.record("rpc.jsonrpc.error_code", error.code);
            span.record("rpc.jsonrpc.error_message", error.message.as_str());
        }

        result
    }
    .instrument(span)
    .await
}

async fn dispatch_inner<H: Handler + ?Sized>(
    handler: &H,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    match message.method.as_str() {
        "initialize" => handle_initialize(handler, message),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => handle_list_tools(handler).await,
        "tools/call" => handle_call_tool(handler, message).await,
        _ => Err(ErrorData::method_not_found(&message.method)),
    }
}

fn handle_initialize<H: Handler + ?Sized>(
    handler: &H,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: InitializeParams = required_params(message, "initialize")?;

    let version = negotiate_version(&params.protocol_version);
    tracing::info!(
        client = %params.client_info.name,
        client_version = %params.client_info.version,
        requested = %params.protocol_version,
        negotiated = %version,
        "MCP client initialized"
    );

    let mut result = InitializeResult::new(version, handler.server_info(), handler.capabilities());
    if let Some(instructions) = handler.instructions() {
        result = result.with_instructions(instructions);
    }

    to_value(&result)
}

async fn handle_list_tools<H: Handler + ?Sized>(handler: &H) -> Result<Value, ErrorData> {
    let tools = handler.list_tools().await?;
    tracing::debug!(count = tools.len(), "Listing tools");
    to_value(&ListToolsResult::all(tools))
}

async fn handle_call_tool<H: Handler + ?Sized>(
    handler: &H,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CallToolParams = required_params(message, "call")?;

    let arguments = params
        .arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let tool_span = tracing::info_span!("mcp.tool.call", mcp.tool.name = %params.name);

    async {
        let result: CallToolResult = handler.call_tool(&params.name, arguments).await?;
        to_value(&result)
    }
    .instrument(tool_span)
    .await
}

fn required_params<T: DeserializeOwned>(message: &JsonRpcMessage, what: &str) -> Result<T, ErrorData> {
    message
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid {} params: {}", what, e)))?
        .ok_or_else(|| ErrorData::invalid_params(format!("Missing {} params", what)))
}

fn to_value<T: Serialize>(result: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::jsonrpc::JsonRpcMessage;
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        async fn list_tools(&self) -> Result<Vec<Tool>, ErrorData> {
            Ok(vec![Tool::new("echo", "Echo the arguments back")])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData> {
            match name {
                "echo" => Ok(CallToolResult::text(arguments.to_string())),
                _ => Err(ErrorData::invalid_params(format!("Unknown tool: {}", name))),
            }
        }

        fn server_info(&self) -> Implementation {
            Implementation::new("echo", "0.0.1")
        }

        fn instructions(&self) -> Option<String> {
            Some("Echoes things.".to_string())
        }
    }

    #[tokio::test]
    async fn test_initialize_echoes_supported_version() {
        let msg = JsonRpcMessage::request(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "1.0" }
            })),
        );

        let result = dispatch(&EchoHandler, &msg).await.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "echo");
        assert_eq!(result["instructions"], "Echoes things.");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialize_without_params() {
        let msg = JsonRpcMessage::request(1, "initialize", None);
        let err = dispatch(&EchoHandler, &msg).await.unwrap_err();
        assert_eq!(err.code, ErrorData::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_ping_and_unknown_method() {
        let ping = dispatch(&EchoHandler, &JsonRpcMessage::request(2, "ping", None))
            .await
            .unwrap();
        assert_eq!(ping, json!({}));

        let err = dispatch(&EchoHandler, &JsonRpcMessage::request(3, "resources/list", None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorData::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_and_call() {
        let list = dispatch(&EchoHandler, &JsonRpcMessage::request(4, "tools/list", None))
            .await
            .unwrap();
        assert_eq!(list["tools"][0]["name"], "echo");

        let call = JsonRpcMessage::request(
            5,
            "tools/call",
            Some(json!({ "name": "echo", "arguments": { "a": 1 } })),
        );
        let result = dispatch(&EchoHandler, &call).await.unwrap();
        assert_eq!(result["content"][0]["text"], "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_call_without_arguments_gets_empty_object() {
        let call = JsonRpcMessage::request(6, "tools/call", Some(json!({ "name": "echo" })));
        let result = dispatch(&EchoHandler, &call).await.unwrap();
        assert_eq!(result["content"][0]["text"], "{}");
    }
}

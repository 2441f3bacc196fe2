//! mcp-stdio - MCP (Model Context Protocol) server library for Rust
//!
//! Serves MCP tools over newline-delimited JSON-RPC 2.0 on stdin/stdout.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_stdio::{Handler, Tool, CallToolResult, ErrorData, Implementation};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl Handler for MyHandler {
//!     async fn list_tools(&self) -> Result<Vec<Tool>, ErrorData> {
//!         Ok(vec![Tool::new("hello", "Say hello")])
//!     }
//!
//!     async fn call_tool(&self, _name: &str, _args: serde_json::Value)
//!         -> Result<CallToolResult, ErrorData>
//!     {
//!         Ok(CallToolResult::text("Hello!"))
//!     }
//!
//!     fn server_info(&self) -> Implementation {
//!         Implementation::new("my-server", "0.1.0")
//!     }
//! }
//!
//! mcp_stdio::serve_stdio(std::sync::Arc::new(MyHandler)).await?;
//! ```

pub mod protocol;
pub mod transport;
pub mod types;

pub use types::content::{Content, ResourceContents};
pub use types::error::ErrorData;
pub use types::jsonrpc::{JsonRpcErrorResponse, JsonRpcMessage, JsonRpcResponse, RequestId};
pub use types::protocol::{Implementation, ServerCapabilities, LATEST_PROTOCOL_VERSION};
pub use types::tool::{CallToolResult, ListToolsResult, Tool, ToolSchema};

pub use protocol::{dispatch, Handler};
pub use transport::{serve, serve_stdio, TransportError};

//! MCP Protocol Types
//!
//! - `jsonrpc` - JSON-RPC 2.0 base types (requests, responses, errors)
//! - `error` - error data with standard error codes
//! - `protocol` - initialize handshake and capability negotiation
//! - `tool` - tool definitions and call results
//! - `content` - content blocks (text, image, embedded resource)

pub mod content;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod tool;

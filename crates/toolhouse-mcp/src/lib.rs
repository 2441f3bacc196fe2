//! toolhouse-mcp - MCP server bridging Toolhouse tools through Groq
//!
//! This library provides:
//! - `handler`: MCP handler backed by Toolhouse and the Groq tool bridge
//! - `stdio`: stdio server entry point
//! - `commands`: one-shot CLI commands (tools, call, config)
//! - `telemetry`: tracing setup (stderr, log file, OTLP)

pub mod commands;
pub mod handler;
pub mod stdio;
pub mod telemetry;

pub use handler::ToolhouseHandler;

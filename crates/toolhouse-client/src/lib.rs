//! Async client for the Toolhouse tool API.
//!
//! Toolhouse serves named tool bundles in several vendor formats. We use two:
//! the listing format (`anthropic`: name, description, input_schema) to build
//! MCP tool lists, and the OpenAI function format to hand tools to the model
//! and execute the calls it makes.

pub mod chat;
pub mod client;
pub mod error;

pub use chat::{ChatFunctionCall, ChatMessage, ChatToolCall};
pub use client::{ToolhouseClient, ToolhouseSettings, ToolhouseTool};
pub use error::{Result, ToolhouseError};

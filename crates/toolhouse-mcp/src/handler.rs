//! MCP handler that exposes a Toolhouse bundle.
//!
//! `tools/list` comes straight from Toolhouse; `tools/call` asks the model to
//! use the tool and returns its answer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use groq_bridge::{render_answer, GenerationConfig, GroqProvider, ToolBridge};
use mcp_stdio::{CallToolResult, ErrorData, Handler, Implementation, Tool, ToolSchema};
use serde_json::Value;
use thconf::ServerConfig;
use toolhouse_client::{ToolhouseClient, ToolhouseSettings, ToolhouseTool};
use tracing::{error, info};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "toolhouse";

pub struct ToolhouseHandler {
    bridge: ToolBridge,
}

impl ToolhouseHandler {
    pub fn new(bridge: ToolBridge) -> Self {
        Self { bridge }
    }

    /// Build the Toolhouse and Groq clients from config.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let toolhouse = ToolhouseClient::new(ToolhouseSettings::from(&config.toolhouse))
            .context("Failed to build Toolhouse client")?;
        let provider =
            GroqProvider::from_config(&config.groq).context("Failed to build Groq client")?;
        let bridge = ToolBridge::new(
            toolhouse,
            provider,
            GenerationConfig::from(&config.groq),
            config.groq.max_tool_rounds,
        );
        Ok(Self::new(bridge))
    }

    pub fn bridge(&self) -> &ToolBridge {
        &self.bridge
    }
}

fn to_mcp_tool(tool: ToolhouseTool) -> Tool {
    Tool {
        name: tool.name,
        description: tool.description,
        input_schema: ToolSchema::from_value(tool.input_schema),
    }
}

#[async_trait]
impl Handler for ToolhouseHandler {
    async fn list_tools(&self) -> Result<Vec<Tool>, ErrorData> {
        match self.bridge.toolhouse().list_mcp_tools().await {
            Ok(tools) => {
                info!(count = tools.len(), "Listed Toolhouse tools");
                Ok(tools.into_iter().map(to_mcp_tool).collect())
            }
            Err(e) => {
                error!(error = %e, "Tool listing failed");
                Err(ErrorData::internal_error(format!("Failed to list tools: {}", e)))
            }
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData> {
        let answer = self.bridge.execute(name, &arguments).await;

        match answer.and_then(|a| render_answer(&a)) {
            Ok(text) => Ok(CallToolResult::text(text)),
            Err(e) => {
                error!(tool = %name, error = %e, "Tool execution failed");
                Ok(CallToolResult::error(format!("Failed to execute tool: {}", e)))
            }
        }
    }

    fn server_info(&self) -> Implementation {
        Implementation::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }
}

//! Stdio MCP server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use thconf::ServerConfig;
use tracing::info;

use crate::handler::ToolhouseHandler;

/// Run the MCP server over stdin/stdout until the client closes stdin.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let handler = Arc::new(ToolhouseHandler::from_config(config)?);

    info!(
        bundle = %config.toolhouse.bundle,
        model = %config.groq.model,
        "Stdio MCP server running"
    );

    mcp_stdio::serve_stdio(handler)
        .await
        .context("Stdio MCP transport failed")?;

    info!("Stdio MCP server shutdown");
    Ok(())
}

//! One-shot CLI commands.

use anyhow::{Context, Result};
use groq_bridge::render_answer;
use serde_json::Value;
use thconf::{ConfigSources, ServerConfig};

use crate::handler::ToolhouseHandler;

/// Print the bundle's tools.
pub async fn tools(config: &ServerConfig, as_json: bool) -> Result<()> {
    let handler = ToolhouseHandler::from_config(config)?;
    let tools = handler
        .bridge()
        .toolhouse()
        .list_mcp_tools()
        .await
        .context("Failed to list tools")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    if tools.is_empty() {
        println!("No tools in bundle '{}'", config.toolhouse.bundle);
        return Ok(());
    }

    println!("Bundle '{}' ({} tools):", config.toolhouse.bundle, tools.len());
    for tool in &tools {
        match &tool.description {
            Some(description) => println!("  {} - {}", tool.name, first_line(description)),
            None => println!("  {}", tool.name),
        }
    }
    Ok(())
}

/// Run one tool through the model and print the answer.
pub async fn call(config: &ServerConfig, name: &str, json: Option<&str>) -> Result<()> {
    let arguments = parse_arguments(json)?;
    let handler = ToolhouseHandler::from_config(config)?;

    let answer = handler
        .bridge()
        .execute(name, &arguments)
        .await
        .context("Failed to execute tool")?;

    println!("{}", render_answer(&answer)?);
    Ok(())
}

/// Print the effective config with keys masked.
pub fn show_config(config: &ServerConfig, sources: &ConfigSources) {
    print!("{}", render_config(config, sources));
}

pub fn render_config(config: &ServerConfig, sources: &ConfigSources) -> String {
    let mut out = String::new();
    if sources.files.is_empty() {
        out.push_str("# No config files found, using defaults\n");
    } else {
        for file in &sources.files {
            out.push_str(&format!("# Loaded: {}\n", file.display()));
        }
    }
    if !sources.env_overrides.is_empty() {
        out.push_str(&format!(
            "# Environment overrides: {}\n",
            sources.env_overrides.join(", ")
        ));
    }
    out.push('\n');
    out.push_str(&config.to_toml());
    out
}

fn parse_arguments(json: Option<&str>) -> Result<Value> {
    match json {
        None => Ok(Value::Object(Default::default())),
        Some(text) => {
            let value: Value = serde_json::from_str(text).context("Invalid JSON arguments")?;
            if !value.is_object() {
                anyhow::bail!("Tool arguments must be a JSON object");
            }
            Ok(value)
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

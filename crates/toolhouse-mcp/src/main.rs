//! toolhouse-mcp - MCP server exposing Toolhouse tools through Groq
//!
//! Subcommands:
//! - `toolhouse-mcp serve` - Run the MCP server over stdio (default)
//! - `toolhouse-mcp tools` - List the bundle's tools
//! - `toolhouse-mcp call <name> [json]` - Run one tool and print the answer
//! - `toolhouse-mcp config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use thconf::{LoggingConfig, ServerConfig};
use toolhouse_mcp::{commands, stdio, telemetry};

#[derive(Parser)]
#[command(name = "toolhouse-mcp")]
#[command(about = "MCP server exposing Toolhouse tools through Groq")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./toolhouse-mcp.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdin/stdout
    Serve,

    /// List tools in the configured bundle
    Tools {
        /// Print the raw tool definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a tool through the model and print the answer
    Call {
        /// Tool name
        name: String,

        /// JSON object of tool arguments
        json: Option<String>,
    },

    /// Show the effective configuration (API keys masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    let (config, sources) = match ServerConfig::load_with_sources_from(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            // No usable logging settings yet; record the failure with defaults.
            let _guard = match command {
                Commands::Serve => telemetry::init(&LoggingConfig::default()).ok(),
                _ => {
                    telemetry::init_cli(&LoggingConfig::default().level);
                    None
                }
            };
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    match command {
        Commands::Serve => {
            let _guard = telemetry::init(&config.logging)?;
            tracing::debug!(files = ?sources.files, env = ?sources.env_overrides, "Config loaded");
            if let Err(e) = config.validate() {
                tracing::error!(error = %e, "Refusing to start");
                return Err(e.into());
            }
            stdio::run(&config).await?;
        }
        Commands::Tools { json } => {
            telemetry::init_cli(&config.logging.level);
            config.validate()?;
            commands::tools(&config, json).await?;
        }
        Commands::Call { name, json } => {
            telemetry::init_cli(&config.logging.level);
            config.validate()?;
            commands::call(&config, &name, json.as_deref()).await?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}

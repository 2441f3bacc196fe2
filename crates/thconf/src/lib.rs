//! Configuration loading for toolhouse-mcp.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/toolhouse-mcp/config.toml` (system)
//! 2. `~/.config/toolhouse-mcp/config.toml` (user)
//! 3. `./toolhouse-mcp.toml` (local override) or an explicit `--config` path
//! 4. Environment variables (`TOOLHOUSE_API_KEY`, `GROQ_API_KEY`, ...)
//!
//! # Example Config
//!
//! ```toml
//! [toolhouse]
//! bundle = "mcp-toolhouse"
//! user_id = "alice"
//!
//! [groq]
//! model = "llama-3.3-70b-versatile"
//! max_tokens = 1024
//!
//! [logging]
//! level = "info"
//! file = "~/.local/state/mcp-toolhouse.log"
//! ```
//!
//! API keys normally come from the environment; the MCP host passes them in
//! its launch descriptor.

pub mod loader;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing {0} environment variable")]
    MissingKey(&'static str),
}

/// Complete server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub toolhouse: ToolhouseConfig,
    pub groq: GroqConfig,
    pub logging: LoggingConfig,
}

/// Toolhouse service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolhouseConfig {
    pub api_key: String,
    pub base_url: String,
    /// Tool bundle exposed to MCP clients.
    pub bundle: String,
    /// Tool format used for `tools/list` (name, description, input_schema).
    pub list_provider: String,
    /// Tool format used when the model executes tools.
    pub call_provider: String,
    /// Sent to Toolhouse as `metadata.id`; scopes per-user tool state.
    pub user_id: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ToolhouseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.toolhouse.ai/v1".to_string(),
            bundle: "mcp-toolhouse".to_string(),
            list_provider: "anthropic".to_string(),
            call_provider: "openai".to_string(),
            user_id: None,
            timeout_secs: 60,
        }
    }
}

/// Groq (OpenAI-compatible) inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Tool-execution rounds before the final answer is requested. 0 is
    /// treated as 1.
    pub max_tool_rounds: u32,
    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 1024,
            temperature: None,
            max_tool_rounds: 1,
            timeout_secs: 120,
        }
    }
}

/// Logging and telemetry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive (trace, debug, info, warn, error, or per-target).
    pub level: String,
    /// Log file path. Empty disables file logging.
    pub file: String,
    /// OTLP gRPC endpoint; telemetry export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "mcp-toolhouse.log".to_string(),
            otlp_endpoint: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log file path, if file logging is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        if self.file.trim().is_empty() {
            None
        } else {
            Some(expand_path(&self.file))
        }
    }
}

impl ServerConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an optional explicit file, then apply env overrides.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report where values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        loader::load_layers(&files, &loader::process_env)
    }

    /// Check that both API keys are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toolhouse.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("TOOLHOUSE_API_KEY"));
        }
        if self.groq.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("GROQ_API_KEY"));
        }
        Ok(())
    }

    /// Copy of the config with API keys masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.toolhouse.api_key = mask(&copy.toolhouse.api_key);
        copy.groq.api_key = mask(&copy.groq.api_key);
        copy
    }

    /// Serialize the redacted config to TOML.
    pub fn to_toml(&self) -> String {
        let body = toml::to_string_pretty(&self.redacted())
            .unwrap_or_else(|e| format!("# failed to render config: {}\n", e));
        format!("# toolhouse-mcp configuration\n\n{}", body)
    }
}

fn mask(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::chat::{ChatMessage, ChatToolCall};
use crate::error::{Result, ToolhouseError};

/// Connection and request-context settings for [`ToolhouseClient`].
#[derive(Debug, Clone)]
pub struct ToolhouseSettings {
    pub api_key: String,
    pub base_url: String,
    pub bundle: String,
    /// Tool format for MCP listings (name, description, input_schema).
    pub list_provider: String,
    /// Tool format the model sees and the format `run_tools` expects.
    pub call_provider: String,
    pub user_id: Option<String>,
    pub timeout: Duration,
}

impl From<&thconf::ToolhouseConfig> for ToolhouseSettings {
    fn from(config: &thconf::ToolhouseConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            bundle: config.bundle.clone(),
            list_provider: config.list_provider.clone(),
            call_provider: config.call_provider.clone(),
            user_id: config.user_id.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// A Toolhouse tool in the listing format, ready to become an MCP tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolhouseTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Thin async client for the Toolhouse REST API.
#[derive(Debug, Clone)]
pub struct ToolhouseClient {
    settings: ToolhouseSettings,
    client: reqwest::Client,
}

impl ToolhouseClient {
    pub fn new(settings: ToolhouseSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ToolhouseSettings {
        &self.settings
    }

    fn metadata(&self) -> Value {
        let mut metadata = Map::new();
        if let Some(id) = &self.settings.user_id {
            metadata.insert("id".to_string(), Value::String(id.clone()));
        }
        Value::Object(metadata)
    }

    /// Fetch the bundle's tool definitions in `provider` format.
    #[tracing::instrument(skip(self), fields(toolhouse.bundle = %self.settings.bundle))]
    pub async fn get_tools(&self, provider: &str) -> Result<Vec<Value>> {
        let body = json!({
            "provider": provider,
            "metadata": self.metadata(),
            "bundle": self.settings.bundle,
        });

        let response = self.post("get_tools", &body).await?;
        match response {
            Value::Array(tools) => {
                debug!(count = tools.len(), "Fetched Toolhouse tools");
                Ok(tools)
            }
            other => Err(ToolhouseError::Decode(format!(
                "expected a tool array, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Fetch the bundle in listing format and parse each entry.
    pub async fn list_mcp_tools(&self) -> Result<Vec<ToolhouseTool>> {
        let raw = self.get_tools(&self.settings.list_provider).await?;
        raw.into_iter()
            .map(|tool| {
                serde_json::from_value::<ToolhouseTool>(tool)
                    .map_err(|e| ToolhouseError::InvalidTool(e.to_string()))
            })
            .collect()
    }

    /// Execute one model-issued tool call and return the `tool` reply.
    #[tracing::instrument(
        skip(self, tool_call),
        fields(tool.name = %tool_call.function.name, tool.call_id = %tool_call.id)
    )]
    pub async fn run_tool(&self, tool_call: &ChatToolCall) -> Result<ChatMessage> {
        let body = json!({
            "content": tool_call,
            "provider": self.settings.call_provider,
            "metadata": self.metadata(),
            "bundle": self.settings.bundle,
        });

        let response = self.post("run_tools", &body).await?;
        let content = response
            .get("content")
            .ok_or_else(|| ToolhouseError::Decode("missing content in run_tools response".into()))?;

        let tool_call_id = content
            .get("tool_call_id")
            .and_then(Value::as_str)
            .unwrap_or(&tool_call.id)
            .to_string();

        let output = match content.get("content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => serde_json::to_string(other)
                .map_err(|e| ToolhouseError::Decode(e.to_string()))?,
        };

        info!(bytes = output.len(), "Tool executed");
        Ok(ChatMessage::tool(tool_call_id, output))
    }

    /// Execute every tool call on `assistant`.
    ///
    /// Returns the assistant message followed by one tool message per call,
    /// ready to append to the conversation. Empty when there are no calls.
    pub async fn run_tools(&self, assistant: &ChatMessage) -> Result<Vec<ChatMessage>> {
        let calls = assistant.tool_calls();
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let mut messages = Vec::with_capacity(calls.len() + 1);
        messages.push(assistant.clone());
        for call in calls {
            messages.push(self.run_tool(call).await?);
        }
        Ok(messages)
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolhouseError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolhouseError::Decode(e.to_string()))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

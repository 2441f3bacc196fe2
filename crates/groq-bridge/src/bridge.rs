use serde_json::Value;
use toolhouse_client::{ChatMessage, ToolhouseClient};
use tracing::info;

use crate::error::BridgeError;
use crate::provider::GroqProvider;
use crate::types::GenerationConfig;

/// Runs a named Toolhouse tool by asking the model to use it.
///
/// The model sees the bundle's tools in OpenAI function format, Toolhouse
/// executes whatever calls it makes, and the model's follow-up answer is the
/// result.
#[derive(Debug, Clone)]
pub struct ToolBridge {
    toolhouse: ToolhouseClient,
    provider: GroqProvider,
    generation: GenerationConfig,
    max_tool_rounds: u32,
}

impl ToolBridge {
    /// `max_tool_rounds` below 1 is raised to 1: a tool call always gets at
    /// least one execution round.
    pub fn new(
        toolhouse: ToolhouseClient,
        provider: GroqProvider,
        generation: GenerationConfig,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            toolhouse,
            provider,
            generation,
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    pub fn max_tool_rounds(&self) -> u32 {
        self.max_tool_rounds
    }

    pub fn toolhouse(&self) -> &ToolhouseClient {
        &self.toolhouse
    }

    /// Run tool `name` with `arguments` and return the model's final answer.
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<Option<String>, BridgeError> {
        let prompt = tool_prompt(name, arguments)?;
        let call_provider = self.toolhouse.settings().call_provider.clone();
        let tools = self.toolhouse.get_tools(&call_provider).await?;

        let mut messages = vec![ChatMessage::user(prompt)];

        for round in 0..self.max_tool_rounds {
            let completion = self.provider.chat(&messages, &tools, &self.generation).await?;

            let outputs = self.toolhouse.run_tools(&completion.message).await?;
            if outputs.is_empty() {
                info!(round, finish_reason = ?completion.finish_reason, "Model answered without tools");
                return Ok(completion.message.content);
            }

            info!(round, tool_calls = outputs.len() - 1, "Executed tool calls");
            messages.extend(outputs);
        }

        let answer = self.provider.chat(&messages, &tools, &self.generation).await?;
        info!(finish_reason = ?answer.finish_reason, "Final answer received");
        Ok(answer.message.content)
    }
}

/// The user turn that asks the model to use `name`.
pub fn tool_prompt(name: &str, arguments: &Value) -> Result<String, BridgeError> {
    let arguments = serde_json::to_string(arguments)?;
    Ok(format!(
        "Can you use the tool {}? Here is some more information that I give you to complete your task: {}",
        name, arguments
    ))
}

/// Answer text as returned to MCP clients: the answer JSON-encoded and
/// pretty-printed, `null` when the model produced no content.
pub fn render_answer(answer: &Option<String>) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(answer)?)
}

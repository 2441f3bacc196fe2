use std::time::Duration;

use serde_json::{json, Value};
use toolhouse_client::ChatMessage;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{ChatCompletion, FinishReason, GenerationConfig, WireCompletion};

/// OpenAI-compatible chat completions client pointed at Groq.
#[derive(Debug, Clone)]
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &thconf::GroqConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Request one completion. `tools` are OpenAI function definitions and
    /// are left out of the request when empty.
    #[tracing::instrument(
        skip(self, messages, tools, config),
        fields(
            gen_ai.system = "groq",
            gen_ai.request.model = %config.model,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        )
    )]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
        config: &GenerationConfig,
    ) -> Result<ChatCompletion, ProviderError> {
        let mut payload = json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "messages": messages,
        });
        if let Some(body) = payload.as_object_mut() {
            if !tools.is_empty() {
                body.insert("tools".to_string(), Value::Array(tools.to_vec()));
            }
            if let Some(temperature) = config.temperature {
                body.insert("temperature".to_string(), json!(temperature));
            }
        }

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireCompletion = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(usage) = &wire.usage {
            let span = tracing::Span::current();
            span.record("gen_ai.usage.input_tokens", usage.prompt_tokens);
            span.record("gen_ai.usage.output_tokens", usage.completion_tokens);
        }

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let finish_reason = FinishReason::from_wire(choice.finish_reason.as_deref());
        debug!(?finish_reason, tool_calls = choice.message.tool_calls().len(), "Completion received");

        Ok(ChatCompletion {
            message: choice.message,
            finish_reason,
            usage: wire.usage,
        })
    }
}

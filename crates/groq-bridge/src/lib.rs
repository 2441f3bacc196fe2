//! Groq chat completions plus the loop that lets the model drive Toolhouse
//! tools.

pub mod bridge;
pub mod error;
pub mod provider;
pub mod types;

pub use bridge::{render_answer, tool_prompt, ToolBridge};
pub use error::{BridgeError, ProviderError};
pub use provider::GroqProvider;
pub use types::{ChatCompletion, FinishReason, GenerationConfig, Usage};

pub use toolhouse_client::{ChatFunctionCall, ChatMessage, ChatToolCall};

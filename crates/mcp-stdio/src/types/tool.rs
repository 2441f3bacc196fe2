//! Tool Types
//!
//! Types for MCP tool definitions and call results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::Content;

/// A tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Programmatic name of the tool.
    pub name: String,

    /// Description for the LLM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for input parameters.
    pub input_schema: ToolSchema,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: ToolSchema::empty(),
        }
    }

    pub fn with_input_schema(mut self, schema: ToolSchema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_input_schema_value(mut self, schema: Value) -> Self {
        self.input_schema = ToolSchema::from_value(schema);
        self
    }
}

/// JSON Schema for tool input.
///
/// Keywords other than `type`, `properties` and `required` are carried in
/// `extra` so upstream schemas pass through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Always "object" for tool schemas.
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolSchema {
    /// Create an empty schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
            extra: Map::new(),
        }
    }

    /// Create a schema from a JSON value. Non-objects yield an empty schema.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::empty();
        };

        let schema_type = map
            .remove("type")
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "object".to_string());

        let properties = match map.remove("properties") {
            Some(Value::Object(props)) => Some(props),
            _ => None,
        };

        let required = match map.remove("required") {
            Some(Value::Array(arr)) => Some(
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            _ => None,
        };

        Self {
            schema_type,
            properties,
            required,
            extra: map,
        }
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call.
    pub name: String,

    /// Arguments to pass to the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks representing the result.
    pub content: Vec<Content>,

    /// Whether the tool call resulted in an error.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![Content::text(text)])
    }

    /// Create an error result. The message is shown to the model.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
        }
    }
}

/// Result of tools/list request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,

    /// Pagination cursor for next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ListToolsResult {
    /// Create a result with all tools (no pagination).
    pub fn all(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            next_cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_serializes_camel_case() {
        let tool = Tool::new("web_search", "Search the web");

        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["name"], "web_search");
        assert_eq!(json["description"], "Search the web");
        assert_eq!(json["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_tool_schema_keeps_extra_keywords() {
        let schema = ToolSchema::from_value(json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"],
            "additionalProperties": false
        }));

        assert_eq!(schema.required, Some(vec!["query".to_string()]));
        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back["additionalProperties"], false);
        assert_eq!(back["properties"]["query"]["type"], "string");
    }

    #[test]
    fn test_tool_schema_from_non_object() {
        assert_eq!(ToolSchema::from_value(json!("nope")), ToolSchema::empty());
    }

    #[test]
    fn test_call_tool_result_success_omits_is_error() {
        let json = serde_json::to_value(CallToolResult::text("ok")).unwrap();
        assert_eq!(json["content"][0]["text"], "ok");
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn test_call_tool_result_error() {
        let json = serde_json::to_value(CallToolResult::error("boom")).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["text"], "boom");
    }
}

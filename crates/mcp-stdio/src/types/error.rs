//! MCP Error Types
//!
//! Error data structures and standard JSON-RPC 2.0 error codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    /// Numeric code; the standard ones are the associated constants.
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    // https://www.jsonrpc.org/specification#error_object
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            Self::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }

    /// Short machine-readable label for the code, used on tracing spans.
    pub fn kind(&self) -> &'static str {
        match self.code {
            Self::PARSE_ERROR => "parse_error",
            Self::INVALID_REQUEST => "invalid_request",
            Self::METHOD_NOT_FOUND => "method_not_found",
            Self::INVALID_PARAMS => "invalid_params",
            Self::INTERNAL_ERROR => "internal_error",
            _ => "application_error",
        }
    }
}

impl std::fmt::Display for ErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_method_wire_shape() {
        let wire = serde_json::to_value(ErrorData::method_not_found("resources/list")).unwrap();
        assert_eq!(
            wire,
            json!({"code": -32601, "message": "Method not found: resources/list"})
        );
    }

    #[test]
    fn test_data_round_trips_through_display() {
        let error = ErrorData::with_data(
            ErrorData::INVALID_PARAMS,
            "tools/call needs a name",
            json!({ "param": "name" }),
        );
        assert_eq!(error.to_string(), "[-32602] tools/call needs a name");
        assert_eq!(error.data, Some(json!({ "param": "name" })));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ErrorData::internal_error("x").kind(), "internal_error");
        assert_eq!(ErrorData::new(-1, "x").kind(), "application_error");
    }
}

/*
[INPUT]:  Log server schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for log server responses
[UPDATE]: When the log server schema changes or new types are added
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Successful body of the log window endpoint; both fields are required
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogPage {
    /// Raw lines, possibly carrying ANSI escape sequences
    pub lines: Vec<String>,
    /// At least one line exists past the requested range
    pub has_more: bool,
}

/// Failure body of the log window endpoint; `error` may hold any JSON value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: Value,
}

impl ErrorResponse {
    /// Pick out the failure body of a decoded response, if it is one
    pub fn from_body(body: &Value) -> Option<Self> {
        body.get("error").map(|error| Self { error: error.clone() })
    }

    pub fn message(&self) -> String {
        match &self.error {
            Value::String(message) => message.clone(),
            Value::Null => "log server reported an unspecified error".to_string(),
            other => other.to_string(),
        }
    }
}

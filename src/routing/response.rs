//! JSON route response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request progress as reported to the page (XMLHttpRequest numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    ResponseIsReady = 4,
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for ReadyState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReadyState::Unsent),
            1 => Ok(ReadyState::Opened),
            2 => Ok(ReadyState::HeadersReceived),
            3 => Ok(ReadyState::Loading),
            4 => Ok(ReadyState::ResponseIsReady),
            other => Err(format!("invalid ready state {}", other)),
        }
    }
}

pub const STATUS_TEXT_ERROR: &str = "An error occurred.";

/// Result of a route invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    pub fn new(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            request_id: None,
            ready_state: ReadyState::ResponseIsReady,
            status,
            status_text: status_text.into(),
            data,
        }
    }

    /// 200 OK carrying `data`.
    pub fn ok(data: impl Into<Value>) -> Self {
        Self::new(200, "OK", data.into())
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request", Value::Null)
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(404, "Not Found", Value::String(format!("Route path not found: {}", path)))
    }

    /// Generic failure returned when a route handler errors or panics.
    pub fn error() -> Self {
        Self::new(400, "Bad Request", Value::String(STATUS_TEXT_ERROR.to_string()))
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON text for a response payload.
///
/// A string that already holds JSON text passes through verbatim; anything
/// else is serialized.
pub fn ensure_json(data: &Value) -> String {
    if let Value::String(text) = data {
        if serde_json::from_str::<Value>(text).is_ok() {
            return text.clone();
        }
    }
    data.to_string()
}

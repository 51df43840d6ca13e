//! Page-facing bound object.
//!
//! Exposes route execution and commands to in-page script. Arguments arrive as
//! loosely typed JSON values and are normalized before dispatch.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::pipeline::request::QueryParams;
use crate::routing::command::CommandTable;
use crate::routing::dispatcher::RouteDispatcher;
use crate::routing::response::ApiResponse;

#[derive(Debug, Clone)]
pub struct JsBinding {
    dispatcher: RouteDispatcher,
    commands: Arc<CommandTable>,
}

impl JsBinding {
    pub fn new(dispatcher: RouteDispatcher, commands: Arc<CommandTable>) -> Self {
        Self {
            dispatcher,
            commands,
        }
    }

    /// Run a route and return the serialized response envelope.
    pub async fn execute(&self, path: &str, params: Option<&Value>, post_data: Option<&Value>) -> String {
        let params = params.map(params_from_json).unwrap_or_default();
        let post_data = match post_data {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        };

        let response = self.dispatcher.dispatch(path, params, post_data).await;
        serde_json::to_string(&response).unwrap_or_else(|e| {
            tracing::error!(path = %path, error = %e, "Failed to serialize route response");
            error_envelope()
        })
    }

    /// Run a command URL. Returns false when nothing matched.
    pub fn command(&self, url: &str) -> bool {
        self.commands.run_str(url)
    }
}

/// Serialized generic error, used when a route response cannot be serialized.
fn error_envelope() -> String {
    let fallback = ApiResponse::error();
    serde_json::to_value(&fallback)
        .unwrap_or_else(|_| {
            json!({
                "readyState": fallback.ready_state,
                "status": fallback.status,
                "statusText": fallback.status_text,
                "data": fallback.data,
            })
        })
        .to_string()
}

/// Flatten a JSON object into query parameters.
///
/// Strings are taken verbatim, arrays contribute one value per element, other
/// values use their JSON text. Non-object input yields no parameters.
fn params_from_json(value: &Value) -> QueryParams {
    let mut params = QueryParams::new();
    let Value::Object(map) = value else {
        return params;
    };
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    params.insert(key.clone(), scalar_text(item));
                }
            }
            other => params.insert(key.clone(), scalar_text(other)),
        }
    }
    params
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

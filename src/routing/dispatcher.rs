//! JSON route dispatch.
//!
//! # Responsibilities
//! - Validate the route path and look it up
//! - Run sync routes on the blocking pool and async routes on their own task
//! - Convert handler failures and panics into a 400 envelope
//! - Render an [`ApiResponse`] into a [`SchemeResponse`] with JSON headers

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::pipeline::request::QueryParams;
use crate::pipeline::response::SchemeResponse;
use crate::routing::response::{ensure_json, ApiResponse};
use crate::routing::router::{RouteHandler, RouteRequest, RouteTable};

pub const MIME_JSON: &str = "application/json";

const JSON_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "private"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET,POST"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Content-Type", "application/json; charset=utf-8"),
];

/// Body written for non-success responses.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope<'a> {
    status: u16,
    status_text: &'a str,
    data: &'a Value,
}

#[derive(Debug, Clone)]
pub struct RouteDispatcher {
    routes: Arc<RouteTable>,
}

impl RouteDispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Invoke the route at `path`. A path with no segments (`""`, `"/"`) is
    /// a bad request.
    pub async fn dispatch(&self, path: &str, params: QueryParams, post_data: String) -> ApiResponse {
        if path.trim_matches('/').is_empty() {
            tracing::warn!("Route request with empty path");
            return ApiResponse::bad_request();
        }

        let Some(handler) = self.routes.get(path).cloned() else {
            tracing::warn!(path = %path, "Route not found");
            return ApiResponse::not_found(path);
        };

        let request = RouteRequest {
            path: path.to_string(),
            params,
            post_data,
        };
        let is_async = handler.is_async();

        let joined = match handler {
            RouteHandler::Sync(f) => tokio::task::spawn_blocking(move || f(request)).await,
            RouteHandler::Async(f) => tokio::spawn(f(request)).await,
        };

        match joined {
            Ok(Ok(response)) => {
                tracing::debug!(path = %path, is_async, status = response.status, "Route completed");
                response
            }
            Ok(Err(e)) => {
                tracing::error!(path = %path, is_async, error = %e, "Route handler failed");
                ApiResponse::error()
            }
            Err(e) => {
                tracing::error!(path = %path, is_async, error = %e, "Route handler panicked");
                ApiResponse::error()
            }
        }
    }
}

/// Render a route result as a scheme response.
pub fn render(response: &ApiResponse) -> SchemeResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_REQUEST);

    let body = if response.is_success() {
        ensure_json(&response.data)
    } else {
        let envelope = ErrorEnvelope {
            status: response.status,
            status_text: &response.status_text,
            data: &response.data,
        };
        serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string())
    };

    let mut rendered =
        SchemeResponse::new(status, MIME_JSON, body).with_status_text(response.status_text.clone());
    for (name, value) in JSON_HEADERS {
        rendered.headers.set(*name, *value);
    }
    rendered
}

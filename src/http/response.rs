//! Outbound HTTP response translation.

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::pipeline::response::SchemeResponse;

const SKIPPED_HEADERS: &[&str] = &["connection", "content-length", "transfer-encoding"];

pub const STATUS_TEXT_CANCELED: &str = "Request canceled";

/// Convert a completed scheme response into an HTTP response.
pub fn into_http_response(response: SchemeResponse) -> Response {
    let status = response.status;
    let mime_type = response.mime_type.clone();
    let headers = response.headers.clone();

    let mut http = Response::new(Body::from(response.into_body()));
    *http.status_mut() = status;

    let out = http.headers_mut();
    for (name, value) in headers.iter() {
        if SKIPPED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                out.append(name, value);
            }
            _ => tracing::debug!(header = %name, "Dropping invalid response header"),
        }
    }
    if !out.contains_key(CONTENT_TYPE) && !mime_type.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&mime_type) {
            out.insert(CONTENT_TYPE, value);
        }
    }
    http
}

pub fn not_handled() -> Response {
    (StatusCode::NOT_FOUND, "No scheme registered for this URL").into_response()
}

pub fn rejected() -> Response {
    (StatusCode::BAD_REQUEST, "Request rejected").into_response()
}

pub fn canceled() -> Response {
    (StatusCode::BAD_GATEWAY, STATUS_TEXT_CANCELED).into_response()
}

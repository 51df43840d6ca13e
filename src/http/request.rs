//! Inbound HTTP request translation.
//!
//! # Responsibilities
//! - Map `/{scheme}/{host}/{path}?{query}` onto `scheme://host/path?query`
//! - Reuse the bridge's `x-request-id` as the scheme request ID
//! - Copy headers and body into a [`SchemeRequest`]
//!
//! # Design Decisions
//! - The raw (still percent-encoded) URI path is used so encoding survives
//! - Hop-by-hop and `Host` headers stay on the bridge side

use axum::http::request::Parts;
use axum::http::Uri;
use bytes::Bytes;
use url::Url;
use uuid::Uuid;

use crate::pipeline::headers::Headers;
use crate::pipeline::request::{PostData, RequestId, SchemeRequest};

pub const X_REQUEST_ID: &str = "x-request-id";

const SKIPPED_HEADERS: &[&str] = &["host", "connection", "content-length", "transfer-encoding"];

/// Scheme URL addressed by a bridge URI, or `None` if it names no scheme and host.
pub fn target_url(uri: &Uri) -> Option<Url> {
    let mut segments = uri.path().trim_start_matches('/').splitn(3, '/');
    let scheme = segments.next().filter(|s| !s.is_empty())?;
    let host = segments.next().filter(|s| !s.is_empty())?;
    let rest = segments.next().unwrap_or("");

    let mut text = format!("{}://{}/{}", scheme, host, rest);
    if let Some(query) = uri.query() {
        text.push('?');
        text.push_str(query);
    }
    Url::parse(&text).ok()
}

/// Request ID carried by the bridge request, or a fresh one.
pub fn request_id(parts: &Parts) -> RequestId {
    parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .map(RequestId::from_uuid)
        .unwrap_or_default()
}

/// Build the scheme request for a bridge request.
pub fn to_scheme_request(parts: &Parts, url: Url, body: Bytes) -> SchemeRequest {
    let headers: Headers = parts
        .headers
        .iter()
        .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    SchemeRequest {
        id: request_id(parts),
        url,
        method: parts.method.clone(),
        headers,
        post_data: (!body.is_empty()).then(|| PostData::from_bytes(body)),
    }
}

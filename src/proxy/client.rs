//! Outbound HTTP forwarding.
//!
//! # Responsibilities
//! - Translate a scheme request into an upstream HTTP request
//! - Buffer the upstream response, racing every await against cancellation
//! - Rewrite response headers for in-page consumption
//!
//! # Design Decisions
//! - Redirects are not followed; 3xx responses go back to the page as-is
//! - Upstream status codes are never treated as errors
//! - Headers that do not form a valid name/value pair are skipped

use std::time::Duration;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::Method;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::{redirect, Body, Client};
use tokio_util::sync::CancellationToken;

use crate::config::schema::ProxyClientConfig;
use crate::pipeline::headers::Headers;
use crate::pipeline::request::SchemeRequest;
use crate::pipeline::response::SchemeResponse;
use crate::proxy::ProxyError;

const X_FRAME_OPTIONS: &str = "x-frame-options";

/// Reject methods the proxy does not forward.
pub fn validate_method(method: &Method) -> Result<(), ProxyError> {
    let supported = [
        Method::GET,
        Method::PUT,
        Method::POST,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::TRACE,
        Method::PATCH,
    ];
    if supported.contains(method) {
        Ok(())
    } else {
        Err(ProxyError::UnsupportedMethod(method.to_string()))
    }
}

/// Shared upstream client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
}

impl ProxyClient {
    pub fn new(config: &ProxyClientConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ProxyError::Build)?;
        Ok(Self { client })
    }

    /// Forward `request` upstream and buffer the response.
    pub async fn forward(
        &self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<SchemeResponse, ProxyError> {
        validate_method(&request.method)?;

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(outbound_headers(&request.headers));

        if let Some(post) = request.post_data.filter(|p| !p.is_empty()) {
            let chunks = futures_util::stream::iter(post.elements)
                .then(|element| async move { element.read().await });
            builder = builder.body(Body::wrap_stream(chunks));
        }

        tracing::debug!(method = %request.method, url = %request.url, "Forwarding request upstream");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProxyError::Canceled),
            result = builder.send() => result.map_err(ProxyError::from_reqwest)?,
        };

        let status = response.status();
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let headers = inbound_headers(response.headers());

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProxyError::Canceled),
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(chunk) => body.extend_from_slice(&chunk.map_err(ProxyError::from_reqwest)?),
                None => break,
            }
        }

        tracing::debug!(status = %status, size = body.len(), "Upstream response received");

        let mut scheme_response = SchemeResponse::new(status, mime_type, body.freeze());
        scheme_response.headers = headers;
        Ok(scheme_response)
    }
}

fn outbound_headers(headers: &Headers) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping invalid request header"),
        }
    }
    map
}

fn inbound_headers(upstream: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in upstream {
        if name.as_str() == X_FRAME_OPTIONS {
            continue;
        }
        headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    if !upstream.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
        headers.append(ACCESS_CONTROL_ALLOW_ORIGIN.as_str(), "*");
    }
    headers
}

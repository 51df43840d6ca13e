//! Handler output model.
//!
//! # Responsibilities
//! - Hold status, MIME type, headers and body for exactly one request
//! - Rewind the body before it is handed to the host's copy step
//!
//! # Design Decisions
//! - Bodies are fully buffered so the content length is always known
//! - Ownership of the body moves to the host with the response

use std::io::{Cursor, Seek, SeekFrom};

use axum::http::StatusCode;
use bytes::Bytes;

use crate::pipeline::headers::Headers;

pub const MIME_TEXT_PLAIN: &str = "text/plain";

/// A complete response produced by a scheme handler.
#[derive(Debug, Clone)]
pub struct SchemeResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub mime_type: String,
    pub headers: Headers,
    body: Cursor<Bytes>,
}

impl SchemeResponse {
    pub fn new(status: StatusCode, mime_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            mime_type: mime_type.into(),
            headers: Headers::new(),
            body: Cursor::new(body.into()),
        }
    }

    /// 200 OK with the given body.
    pub fn ok(mime_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, mime_type, body).with_status_text("OK")
    }

    /// A plain-text failure response whose body is the status text.
    pub fn failure(status: StatusCode, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        Self::new(status, MIME_TEXT_PLAIN, Bytes::from(status_text.clone()))
            .with_status_text(status_text)
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn content_length(&self) -> u64 {
        self.body.get_ref().len() as u64
    }

    /// Reset the body position to the start.
    pub fn rewind(&mut self) {
        // Seeking a cursor to an absolute offset cannot fail.
        let _ = self.body.seek(SeekFrom::Start(0));
    }

    pub fn body_position(&self) -> u64 {
        self.body.position()
    }

    /// Readable view of the body, starting at the current position.
    pub fn body_reader(&mut self) -> &mut Cursor<Bytes> {
        &mut self.body
    }

    /// The whole body, regardless of the read position.
    pub fn body_bytes(&self) -> &Bytes {
        self.body.get_ref()
    }

    pub fn into_body(self) -> Bytes {
        self.body.into_inner()
    }
}

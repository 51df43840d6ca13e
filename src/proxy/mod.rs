//! External request proxy subsystem.
//!
//! # Data Flow
//! ```text
//! SchemeRequest (method, url, headers, post data)
//!     → client.rs (method check, header copy, streamed body)
//!     → upstream HTTP server
//!     → client.rs (X-Frame-Options stripped, CORS origin added, body buffered)
//!     → SchemeResponse (status passed through, MIME from Content-Type)
//! ```
//!
//! # Design Decisions
//! - One shared client per host; connection pooling is the client's job
//! - Cancellation and timeouts end the request silently (no error response)

pub mod client;

pub use client::{validate_method, ProxyClient};

/// Errors raised while forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream request was canceled")]
    Canceled,

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Upstream(err)
        }
    }

    /// Whether the request ended by cancellation or timeout rather than failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProxyError::Timeout | ProxyError::Canceled)
    }
}

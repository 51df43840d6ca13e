//! Scheme handler capability.
//!
//! # Responsibilities
//! - Define the per-request handler contract shared by every scheme kind
//! - Define the factory bound to a registry entry
//!
//! # Design Decisions
//! - `prepare` runs on the calling (host) thread and must stay cheap
//! - `process` runs on a runtime task and owns the request
//! - A fresh handler per request keeps request state private

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::pipeline::request::SchemeRequest;
use crate::pipeline::response::SchemeResponse;
use crate::scheme::UrlScheme;

/// Errors surfaced by handlers to the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The request was aborted (token, timeout, disposal). Not an error outcome.
    #[error("request was canceled")]
    Canceled,

    /// The request cannot be handled at all; rejected before any work starts.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Work failed after it started.
    #[error("handler failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        HandlerError::Failed(Box::new(err))
    }
}

/// Per-request handler.
///
/// `Ok(None)` from `process` means "no stream to deliver" and ends the request
/// with Cancel.
#[async_trait]
pub trait SchemeHandler: Send {
    /// Validate the request before any work is scheduled.
    fn prepare(&mut self, _request: &SchemeRequest) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn process(
        &mut self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<Option<SchemeResponse>, HandlerError>;
}

/// Creates one handler per request for a registered scheme.
pub trait SchemeHandlerFactory: Send + Sync {
    fn create(&self, scheme: &UrlScheme) -> Box<dyn SchemeHandler>;
}

impl<F> SchemeHandlerFactory for F
where
    F: Fn(&UrlScheme) -> Box<dyn SchemeHandler> + Send + Sync,
{
    fn create(&self, scheme: &UrlScheme) -> Box<dyn SchemeHandler> {
        self(scheme)
    }
}

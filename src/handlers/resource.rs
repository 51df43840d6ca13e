//! Static resource handlers (filesystem and bundle).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::pipeline::handler::{HandlerError, SchemeHandler};
use crate::pipeline::request::SchemeRequest;
use crate::pipeline::response::SchemeResponse;
use crate::resource::{BundleResolver, ErrorHandler, FileResolver, Resource, ResourceError};

/// Serves `scheme://host/path` from a directory.
pub struct ResourceSchemeHandler {
    resolver: FileResolver,
    errors: Arc<dyn ErrorHandler>,
}

impl ResourceSchemeHandler {
    pub fn new(resolver: FileResolver, errors: Arc<dyn ErrorHandler>) -> Self {
        Self { resolver, errors }
    }
}

#[async_trait]
impl SchemeHandler for ResourceSchemeHandler {
    async fn process(
        &mut self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<Option<SchemeResponse>, HandlerError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HandlerError::Canceled),
            result = self.resolver.resolve(&request.url) => result,
        };
        Ok(Some(respond(&request.url, result, self.errors.as_ref())))
    }
}

/// Serves `scheme://host/path` from an embedded bundle.
pub struct BundleSchemeHandler {
    resolver: Option<BundleResolver>,
    errors: Arc<dyn ErrorHandler>,
}

impl BundleSchemeHandler {
    /// `resolver` is `None` when the scheme was registered without bundle
    /// options; such requests are rejected.
    pub fn new(resolver: Option<BundleResolver>, errors: Arc<dyn ErrorHandler>) -> Self {
        Self { resolver, errors }
    }
}

#[async_trait]
impl SchemeHandler for BundleSchemeHandler {
    fn prepare(&mut self, _request: &SchemeRequest) -> Result<(), HandlerError> {
        if self.resolver.is_none() {
            return Err(HandlerError::Rejected(
                "scheme has no bundle configured".to_string(),
            ));
        }
        Ok(())
    }

    async fn process(
        &mut self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<Option<SchemeResponse>, HandlerError> {
        let Some(resolver) = &self.resolver else {
            return Err(HandlerError::Rejected("scheme has no bundle configured".to_string()));
        };
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HandlerError::Canceled),
            result = resolver.resolve(&request.url) => result,
        };
        Ok(Some(respond(&request.url, result, self.errors.as_ref())))
    }
}

fn respond(url: &Url, result: Result<Resource, ResourceError>, errors: &dyn ErrorHandler) -> SchemeResponse {
    match result {
        Ok(resource) => {
            tracing::debug!(url = %url, mime = %resource.mime_type, size = resource.bytes.len(), "Resource served");
            SchemeResponse::ok(resource.mime_type, resource.bytes)
        }
        Err(e) => errors.handle_error(url, &e),
    }
}

//! Local JSON request handler.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::pipeline::handler::{HandlerError, SchemeHandler};
use crate::pipeline::request::SchemeRequest;
use crate::pipeline::response::SchemeResponse;
use crate::routing::{render, RouteDispatcher};

/// Maps `scheme://host/route?query` to a registered route.
pub struct RequestSchemeHandler {
    dispatcher: RouteDispatcher,
}

impl RequestSchemeHandler {
    pub fn new(dispatcher: RouteDispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl SchemeHandler for RequestSchemeHandler {
    async fn process(
        &mut self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<Option<SchemeResponse>, HandlerError> {
        let path = request.url.path().to_string();
        let params = request.query_params();
        let post_data = request.post_data_text();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HandlerError::Canceled),
            response = self.dispatcher.dispatch(&path, params, post_data) => response,
        };
        let response = match response.request_id {
            Some(_) => response,
            None => response.with_request_id(request.id.to_string()),
        };

        Ok(Some(render(&response)))
    }
}

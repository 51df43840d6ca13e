//! External request handler.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::pipeline::handler::{HandlerError, SchemeHandler};
use crate::pipeline::request::SchemeRequest;
use crate::pipeline::response::SchemeResponse;
use crate::proxy::{validate_method, ProxyClient, ProxyError};

/// Forwards the request to the real HTTP endpoint named by its URL.
pub struct ExternalRequestHandler {
    client: ProxyClient,
}

impl ExternalRequestHandler {
    pub fn new(client: ProxyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemeHandler for ExternalRequestHandler {
    fn prepare(&mut self, request: &SchemeRequest) -> Result<(), HandlerError> {
        validate_method(&request.method).map_err(|e| HandlerError::Rejected(e.to_string()))
    }

    async fn process(
        &mut self,
        request: SchemeRequest,
        cancel: CancellationToken,
    ) -> Result<Option<SchemeResponse>, HandlerError> {
        match self.client.forward(request, cancel).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_cancellation() => {
                tracing::debug!(error = %e, "External request ended early");
                Err(HandlerError::Canceled)
            }
            Err(ProxyError::UnsupportedMethod(method)) => Err(HandlerError::Rejected(method)),
            Err(e) => Err(HandlerError::failed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ProxyClientConfig;
    use axum::http::Method;

    #[test]
    fn test_prepare_rejects_unknown_method() {
        let client = ProxyClient::new(&ProxyClientConfig::default()).unwrap();
        let mut handler = ExternalRequestHandler::new(client);
        let request = SchemeRequest::new(
            Method::from_bytes(b"CONNECT").unwrap(),
            url::Url::parse("https://example.org/").unwrap(),
        );

        assert!(matches!(handler.prepare(&request), Err(HandlerError::Rejected(_))));
    }
}

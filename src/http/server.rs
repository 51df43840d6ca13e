//! HTTP bridge server.
//!
//! # Responsibilities
//! - Create the Axum Router that fronts the scheme pipeline
//! - Wire up middleware (request ID, tracing, timeout)
//! - Translate bridge requests into scheme requests and back
//! - Cancel and drain in-flight scheme requests on shutdown

use std::future::Future;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::BridgeConfig;
use crate::http::request::{target_url, to_scheme_request};
use crate::http::response::{canceled, into_http_response, not_handled, rejected};
use crate::pipeline::callback::Completion;
use crate::pipeline::runner::{Dispatched, RequestPipeline};

/// Largest request body the bridge buffers.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct BridgeState {
    pub pipeline: RequestPipeline,
}

/// HTTP server exposing registered schemes as `/{scheme}/{host}/{*path}`.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
    pipeline: RequestPipeline,
}

impl HttpServer {
    pub fn new(config: BridgeConfig, pipeline: RequestPipeline) -> Self {
        let state = BridgeState {
            pipeline: pipeline.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            pipeline,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BridgeConfig, state: BridgeState) -> Router {
        Router::new()
            .route("/{scheme}/{host}", any(bridge_handler))
            .route("/{scheme}/{host}/", any(bridge_handler))
            .route("/{scheme}/{host}/{*path}", any(bridge_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.request_timeout_secs,
                    ))),
            )
    }

    /// The router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then cancel and drain scheme requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP bridge starting");

        let pipeline = self.pipeline.clone();
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            // Open bridge connections wait on these; cancel so they can drain.
            pipeline.cancel_all();
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;

        self.pipeline
            .shutdown(Duration::from_secs(self.config.shutdown_grace_secs))
            .await;

        tracing::info!("HTTP bridge stopped");
        Ok(())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

async fn bridge_handler(State(state): State<BridgeState>, request: Request<Body>) -> Response {
    let Some(url) = target_url(request.uri()) else {
        tracing::debug!(uri = %request.uri(), "Bridge URI does not name a scheme URL");
        return not_handled();
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to read bridge request body");
            return rejected();
        }
    };

    let scheme_request = to_scheme_request(&parts, url, body);
    let request_id = scheme_request.id;
    tracing::debug!(request_id = %request_id, url = %scheme_request.url, "Bridging request");

    match state.pipeline.execute(scheme_request).await {
        Dispatched::NotHandled => not_handled(),
        Dispatched::Rejected => rejected(),
        Dispatched::Finished(Completion::Cancel) => canceled(),
        Dispatched::Finished(Completion::Continue(response)) => {
            into_http_response(response).into_response()
        }
    }
}

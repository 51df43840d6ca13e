//! Request pipeline.
//!
//! # Responsibilities
//! - Resolve the handler for a request from the scheme registry
//! - Run the cheap validation step on the caller's thread
//! - Schedule handler work on the runtime and deliver exactly one outcome
//! - Track, cancel and drain in-flight requests
//!
//! # Design Decisions
//! - `begin` never awaits; all I/O happens on a spawned task
//! - The task owns the handler, the request and the callback, so every exit
//!   path (including a panic) releases them
//! - Cancellation is cooperative through a per-request token and is raced
//!   against the handler with `select!`

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

use crate::observability::metrics::{self, Outcome};
use crate::pipeline::callback::{ChannelCallback, Completion, CompletionCallback};
use crate::pipeline::handler::HandlerError;
use crate::pipeline::inflight::InflightRequests;
use crate::pipeline::request::{RequestId, SchemeRequest};
use crate::scheme::registry::SchemeRegistry;

/// Result of [`RequestPipeline::begin`].
#[derive(Debug)]
pub enum BeginOutcome {
    /// No registered scheme or no bound handler. The callback was cancelled.
    NotHandled,
    /// The handler refused the request up front. The callback was cancelled.
    Rejected,
    /// Work was scheduled; the callback fires when it finishes.
    ContinueAsync(RequestHandle),
}

impl BeginOutcome {
    pub fn is_async(&self) -> bool {
        matches!(self, BeginOutcome::ContinueAsync(_))
    }
}

/// Handle to a scheduled request.
#[derive(Debug)]
pub struct RequestHandle {
    id: RequestId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RequestHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Ask the request to stop. The callback receives Cancel unless the
    /// response was already delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Guard that cancels the request when dropped, unless disarmed first.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Wait for the request task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(request_id = %self.id, error = %e, "Request task aborted");
        }
    }
}

/// Outcome of [`RequestPipeline::execute`].
#[derive(Debug)]
pub enum Dispatched {
    NotHandled,
    Rejected,
    Finished(Completion),
}

#[derive(Clone)]
pub struct RequestPipeline {
    registry: Arc<SchemeRegistry>,
    inflight: InflightRequests,
    runtime: Handle,
}

impl RequestPipeline {
    pub fn new(registry: Arc<SchemeRegistry>, runtime: Handle) -> Self {
        Self {
            registry,
            inflight: InflightRequests::new(),
            runtime,
        }
    }

    /// Pipeline bound to the runtime the caller is running on.
    ///
    /// # Panics
    /// Outside a tokio runtime.
    pub fn current(registry: Arc<SchemeRegistry>) -> Self {
        Self::new(registry, Handle::current())
    }

    pub fn registry(&self) -> &Arc<SchemeRegistry> {
        &self.registry
    }

    pub fn inflight(&self) -> &InflightRequests {
        &self.inflight
    }

    /// Start processing `request`.
    ///
    /// Safe to call from a thread that must not block: only the registry
    /// lookup and the handler's `prepare` run here.
    pub fn begin(&self, request: SchemeRequest, callback: CompletionCallback) -> BeginOutcome {
        let started = Instant::now();
        let id = request.id;

        let Some(entry) = self.registry.entry_for_url(&request.url) else {
            tracing::debug!(request_id = %id, url = %request.url, "No scheme registered for request");
            metrics::record_request(None, Outcome::NotHandled, started.elapsed());
            callback.cancel();
            return BeginOutcome::NotHandled;
        };
        let kind = entry.scheme.kind;
        let Some(factory) = entry.handler else {
            tracing::debug!(request_id = %id, url = %request.url, kind = %kind, "Scheme has no handler bound");
            metrics::record_request(Some(kind), Outcome::NotHandled, started.elapsed());
            callback.cancel();
            return BeginOutcome::NotHandled;
        };

        let mut handler = factory.create(&entry.scheme);
        if let Err(e) = handler.prepare(&request) {
            tracing::warn!(request_id = %id, url = %request.url, kind = %kind, error = %e, "Request rejected");
            metrics::record_request(Some(kind), Outcome::Rejected, started.elapsed());
            callback.cancel();
            return BeginOutcome::Rejected;
        }

        let token = CancellationToken::new();
        let guard = self.inflight.track(id, token.clone());
        let span = tracing::info_span!("scheme_request", request_id = %id, kind = %kind);
        let task_token = token.clone();

        let task = self.runtime.spawn(
            async move {
                let _guard = guard;
                let url = request.url.clone();
                tracing::debug!(url = %url, method = %request.method, "Processing request");

                let result = tokio::select! {
                    biased;
                    _ = task_token.cancelled() => Err(HandlerError::Canceled),
                    result = handler.process(request, task_token.clone()) => result,
                };

                let outcome = match result {
                    Ok(Some(response)) => {
                        tracing::debug!(url = %url, status = %response.status, "Request completed");
                        callback.complete(response);
                        Outcome::Completed
                    }
                    Ok(None) => {
                        tracing::debug!(url = %url, "Handler produced no response");
                        callback.cancel();
                        Outcome::Canceled
                    }
                    Err(HandlerError::Canceled) => {
                        tracing::info!(url = %url, "Request canceled");
                        callback.cancel();
                        Outcome::Canceled
                    }
                    Err(e) => {
                        tracing::error!(url = %url, error = %e, "Request failed");
                        callback.cancel();
                        Outcome::Failed
                    }
                };
                metrics::record_request(Some(kind), outcome, started.elapsed());
            }
            .instrument(span),
        );

        BeginOutcome::ContinueAsync(RequestHandle {
            id,
            cancel: token,
            task,
        })
    }

    /// Run `request` to completion and return its outcome.
    ///
    /// Dropping the returned future (client disconnect, outer timeout)
    /// cancels the request.
    pub async fn execute(&self, request: SchemeRequest) -> Dispatched {
        let (callback, rx) = ChannelCallback::channel();
        match self.begin(request, CompletionCallback::new(callback)) {
            BeginOutcome::NotHandled => Dispatched::NotHandled,
            BeginOutcome::Rejected => Dispatched::Rejected,
            BeginOutcome::ContinueAsync(handle) => {
                let guard = handle.cancel_on_drop();
                let completion = rx.await.unwrap_or(Completion::Cancel);
                guard.disarm();
                Dispatched::Finished(completion)
            }
        }
    }

    pub fn cancel(&self, id: &RequestId) -> bool {
        self.inflight.cancel(id)
    }

    pub fn cancel_all(&self) -> usize {
        self.inflight.cancel_all()
    }

    /// Cancel everything in flight and wait up to `grace` for the tasks to end.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let canceled = self.cancel_all();
        if canceled > 0 {
            tracing::info!(canceled, "Cancelling in-flight requests");
        }
        let drained = self.inflight.wait_drained(grace).await;
        if !drained {
            tracing::warn!(remaining = self.inflight.len(), "In-flight requests did not finish in time");
        }
        drained
    }
}

//! Completion callback with a single-fire guarantee.
//!
//! # Responsibilities
//! - Deliver exactly one terminal outcome per request: Continue or Cancel
//! - Release the host callback on every exit path
//!
//! # Design Decisions
//! - Terminal methods consume the callback, so a second signal does not compile
//! - Dropping an unfired callback delivers Cancel (covers early returns and panics)

use tokio::sync::oneshot;

use crate::pipeline::response::SchemeResponse;

/// Host-side receiver of a request's terminal outcome.
///
/// Implemented by the embedding layer (a browser engine callback, the HTTP
/// bridge, a test probe). Each method is called at most once per request and
/// never both.
pub trait ResourceCallback: Send + 'static {
    fn on_continue(&mut self, response: SchemeResponse);
    fn on_cancel(&mut self);
}

/// Terminal outcome of a request.
#[derive(Debug)]
pub enum Completion {
    Continue(SchemeResponse),
    Cancel,
}

impl Completion {
    pub fn is_cancel(&self) -> bool {
        matches!(self, Completion::Cancel)
    }

    pub fn into_response(self) -> Option<SchemeResponse> {
        match self {
            Completion::Continue(resp) => Some(resp),
            Completion::Cancel => None,
        }
    }
}

/// Scoped owner of a host callback.
pub struct CompletionCallback {
    inner: Option<Box<dyn ResourceCallback>>,
}

impl CompletionCallback {
    pub fn new(callback: impl ResourceCallback) -> Self {
        Self {
            inner: Some(Box::new(callback)),
        }
    }

    /// Finish the request with a response. The body is rewound first.
    pub fn complete(mut self, mut response: SchemeResponse) {
        if let Some(mut cb) = self.inner.take() {
            response.rewind();
            cb.on_continue(response);
        }
    }

    /// Finish the request without a response.
    pub fn cancel(mut self) {
        if let Some(mut cb) = self.inner.take() {
            cb.on_cancel();
        }
    }

    pub fn finish(self, completion: Completion) {
        match completion {
            Completion::Continue(resp) => self.complete(resp),
            Completion::Cancel => self.cancel(),
        }
    }
}

impl Drop for CompletionCallback {
    fn drop(&mut self) {
        if let Some(mut cb) = self.inner.take() {
            tracing::debug!("Completion callback released without outcome, cancelling");
            cb.on_cancel();
        }
    }
}

/// Callback that forwards the outcome over a oneshot channel.
pub struct ChannelCallback {
    tx: Option<oneshot::Sender<Completion>>,
}

impl ChannelCallback {
    /// Create a callback and the receiver that observes its outcome.
    pub fn channel() -> (Self, oneshot::Receiver<Completion>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    fn send(&mut self, completion: Completion) {
        if let Some(tx) = self.tx.take() {
            // Receiver gone means nobody waits for this request anymore.
            let _ = tx.send(completion);
        }
    }
}

impl ResourceCallback for ChannelCallback {
    fn on_continue(&mut self, response: SchemeResponse) {
        self.send(Completion::Continue(response));
    }

    fn on_cancel(&mut self) {
        self.send(Completion::Cancel);
    }
}

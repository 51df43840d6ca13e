//! In-flight request tracking.
//!
//! # Responsibilities
//! - Map request IDs to their cancellation tokens
//! - Cancel one request or all of them
//! - Let shutdown wait until every tracked request has finished
//!
//! # Design Decisions
//! - Entries are released by a guard owned by the request task, so a
//!   finished, canceled or panicked task always untracks itself
//! - Release is idempotent

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::pipeline::request::RequestId;

/// Thread-safe table of in-flight requests. Cheap to clone.
#[derive(Clone, Default)]
pub struct InflightRequests {
    inner: Arc<DashMap<RequestId, CancellationToken>>,
    drained: Arc<Notify>,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id` until the returned guard is released or dropped.
    pub fn track(&self, id: RequestId, token: CancellationToken) -> InflightGuard {
        self.inner.insert(id, token);
        metrics::inflight_changed(1.0);
        InflightGuard {
            requests: self.clone(),
            id,
            released: false,
        }
    }

    /// Cancel one request. Returns false if it is not in flight.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match self.inner.get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every request in flight. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut count = 0;
        for entry in self.inner.iter() {
            entry.value().cancel();
            count += 1;
        }
        count
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.inner.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Wait until nothing is in flight or `timeout` passes.
    /// Returns true when drained.
    pub async fn wait_drained(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.drained.notified();
                if self.inner.is_empty() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    fn release(&self, id: &RequestId) {
        if self.inner.remove(id).is_some() {
            metrics::inflight_changed(-1.0);
        }
        if self.inner.is_empty() {
            self.drained.notify_waiters();
        }
    }
}

/// Removes a request from the in-flight table when dropped.
pub struct InflightGuard {
    requests: InflightRequests,
    id: RequestId,
    released: bool,
}

impl InflightGuard {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.requests.release(&self.id);
        }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.release();
    }
}

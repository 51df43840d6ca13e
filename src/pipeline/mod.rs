//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Host: SchemeRequest + ResourceCallback
//!     → runner.rs  (registry lookup → NotHandled)
//!                  (factory.create + handler.prepare → Rejected)
//!                  (spawn off-thread work → ContinueAsync)
//!     → handler.rs (SchemeHandler::process, cancellable)
//!     → callback.rs (exactly one of Continue(response) / Cancel)
//!
//! Tracking:
//!     inflight.rs (RequestId → CancellationToken, released by guard)
//! ```
//!
//! # Design Decisions
//! - The caller's thread only does lookup and validation
//! - One handler instance per request, dropped with the task
//! - Every exit path delivers exactly one outcome

pub mod callback;
pub mod handler;
pub mod headers;
pub mod inflight;
pub mod request;
pub mod response;
pub mod runner;

pub use callback::{ChannelCallback, Completion, CompletionCallback, ResourceCallback};
pub use handler::{HandlerError, SchemeHandler, SchemeHandlerFactory};
pub use headers::Headers;
pub use inflight::{InflightGuard, InflightRequests};
pub use request::{PostData, PostDataElement, QueryParams, RequestId, SchemeRequest};
pub use response::SchemeResponse;
pub use runner::{BeginOutcome, Dispatched, RequestHandle, RequestPipeline};

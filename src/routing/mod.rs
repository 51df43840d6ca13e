//! JSON route subsystem.
//!
//! # Data Flow
//! ```text
//! scheme://host/path?query  (+ first post-data element)
//!     → dispatcher.rs (empty path → 400, lookup, sync/async invocation)
//!     → router.rs     (path → RouteHandler)
//!     → response.rs   (ApiResponse envelope, ensure_json)
//!     → dispatcher::render → SchemeResponse with JSON headers
//!
//! Page script:
//!     → binding.rs (execute → serialized envelope, command → command.rs)
//! ```
//!
//! # Design Decisions
//! - Route and command tables are built at startup and never mutated
//! - Handler failures stay inside the dispatcher and surface as a 400 envelope
//! - Commands never produce a response

pub mod binding;
pub mod command;
pub mod dispatcher;
pub mod response;
pub mod router;

pub use binding::JsBinding;
pub use command::CommandTable;
pub use dispatcher::{render, RouteDispatcher};
pub use response::{ensure_json, ApiResponse, ReadyState};
pub use router::{RouteError, RouteHandler, RouteRequest, RouteResult, RouteTable};

//! HTTP bridge subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request /{scheme}/{host}/{*path}?{query}
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (scheme URL, headers, body → SchemeRequest)
//!     → pipeline (NotHandled | Rejected | Continue | Cancel)
//!     → response.rs (SchemeResponse → HTTP response; 404 / 400 / 502)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{BridgeState, HttpServer};

//! Scheme dispatch core for embedded browser hosts.
//!
//! Routes custom-scheme requests (`local://dist/index.html`,
//! `http://command.com/movies`) to static resource resolvers, JSON route
//! handlers, or an outbound HTTP proxy, and delivers exactly one outcome per
//! request to the host's callback.

// Core subsystems
pub mod handlers;
pub mod pipeline;
pub mod proxy;
pub mod resource;
pub mod routing;
pub mod scheme;

// Host surface
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::HostConfig;
pub use http::HttpServer;
pub use lifecycle::{Host, Shutdown};
pub use pipeline::{BeginOutcome, CompletionCallback, RequestPipeline, SchemeRequest, SchemeResponse};
pub use scheme::{SchemeKind, SchemeRegistry, UrlScheme};

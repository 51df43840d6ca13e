//! Route table.
//!
//! # Responsibilities
//! - Map route paths to sync or async handlers
//! - Report whether a route is async before it is invoked
//!
//! # Design Decisions
//! - Populated at startup, read-only afterwards (shared behind `Arc`)
//! - First registration of a path wins, like the scheme registry
//! - Exact path match; query strings never reach the table

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::pipeline::request::QueryParams;
use crate::routing::response::ApiResponse;

/// Input to a route handler.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    pub path: String,
    pub params: QueryParams,
    pub post_data: String,
}

/// Failure raised by a route handler.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Handler(String),
}

impl RouteError {
    pub fn handler(message: impl fmt::Display) -> Self {
        RouteError::Handler(message.to_string())
    }
}

pub type RouteResult = Result<ApiResponse, RouteError>;

type SyncRouteFn = dyn Fn(RouteRequest) -> RouteResult + Send + Sync;
type AsyncRouteFn = dyn Fn(RouteRequest) -> BoxFuture<'static, RouteResult> + Send + Sync;

/// A registered route handler.
#[derive(Clone)]
pub enum RouteHandler {
    /// Blocking handler, run on the blocking pool.
    Sync(Arc<SyncRouteFn>),
    /// Handler returning a future, run on its own task.
    Async(Arc<AsyncRouteFn>),
}

impl RouteHandler {
    pub fn is_async(&self) -> bool {
        matches!(self, RouteHandler::Async(_))
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Sync(_) => f.write_str("RouteHandler::Sync"),
            RouteHandler::Async(_) => f.write_str("RouteHandler::Async"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: HashMap<String, RouteHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blocking route.
    pub fn route<F>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(RouteRequest) -> RouteResult + Send + Sync + 'static,
    {
        self.insert(path, RouteHandler::Sync(Arc::new(handler)));
        self
    }

    /// Add an async route.
    pub fn route_async<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RouteResult> + Send + 'static,
    {
        self.insert(
            path,
            RouteHandler::Async(Arc::new(move |req| Box::pin(handler(req)))),
        );
        self
    }

    /// Insert a handler. Returns false if the path was already taken.
    pub fn insert(&mut self, path: &str, handler: RouteHandler) -> bool {
        let path = normalize(path);
        if self.routes.contains_key(&path) {
            tracing::warn!(path = %path, "Route already registered, ignoring");
            return false;
        }
        self.routes.insert(path, handler);
        true
    }

    pub fn get(&self, path: &str) -> Option<&RouteHandler> {
        self.routes.get(&normalize(path))
    }

    /// Whether `path` names an async route. Unknown paths are not async.
    pub fn is_async(&self, path: &str) -> bool {
        self.get(path).is_some_and(RouteHandler::is_async)
    }

    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Route keys always carry one leading slash.
fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

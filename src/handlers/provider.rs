//! Handler provider.
//!
//! # Responsibilities
//! - Hold one handler factory per handled scheme kind
//! - Let the application override the default factory of a kind
//! - Bind factories to every registered scheme that has none yet
//!
//! # Design Decisions
//! - Factories capture shared collaborators (`Arc`s, clients) and build a
//!   fresh handler per request
//! - A scheme's `base_folder` re-roots the filesystem resolver (relative
//!   folders are joined onto the configured root)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::handlers::external::ExternalRequestHandler;
use crate::handlers::request::RequestSchemeHandler;
use crate::handlers::resource::{BundleSchemeHandler, ResourceSchemeHandler};
use crate::pipeline::handler::{SchemeHandler, SchemeHandlerFactory};
use crate::proxy::ProxyClient;
use crate::resource::{BundleResolver, DefaultErrorHandler, ErrorHandler, FileResolver, MimeMapper, StaticMimeMap};
use crate::routing::RouteDispatcher;
use crate::scheme::{RegistryError, SchemeKind, SchemeRegistry, UrlScheme};

/// Shared collaborators of the default handlers.
#[derive(Clone)]
pub struct HandlerContext {
    pub resource_root: PathBuf,
    pub mime: Arc<dyn MimeMapper>,
    pub errors: Arc<dyn ErrorHandler>,
    pub dispatcher: RouteDispatcher,
    pub proxy: ProxyClient,
}

impl HandlerContext {
    pub fn new(resource_root: impl Into<PathBuf>, dispatcher: RouteDispatcher, proxy: ProxyClient) -> Self {
        Self {
            resource_root: resource_root.into(),
            mime: Arc::new(StaticMimeMap),
            errors: Arc::new(DefaultErrorHandler),
            dispatcher,
            proxy,
        }
    }

    pub fn with_error_handler(mut self, errors: Arc<dyn ErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_mime_mapper(mut self, mime: Arc<dyn MimeMapper>) -> Self {
        self.mime = mime;
        self
    }

    /// Filesystem resolver for `scheme`.
    pub fn file_resolver(&self, scheme: &UrlScheme) -> FileResolver {
        let root = if scheme.base_folder.is_empty() {
            self.resource_root.clone()
        } else {
            self.resource_root.join(&scheme.base_folder)
        };
        FileResolver::new(root).with_mime_mapper(self.mime.clone())
    }
}

pub struct HandlerProvider {
    factories: HashMap<SchemeKind, Arc<dyn SchemeHandlerFactory>>,
}

impl HandlerProvider {
    /// Provider with the default factory for every handled kind.
    pub fn new(ctx: HandlerContext) -> Self {
        let mut factories: HashMap<SchemeKind, Arc<dyn SchemeHandlerFactory>> = HashMap::new();

        let c = ctx.clone();
        factories.insert(
            SchemeKind::Resource,
            Arc::new(move |scheme: &UrlScheme| -> Box<dyn SchemeHandler> {
                Box::new(ResourceSchemeHandler::new(c.file_resolver(scheme), c.errors.clone()))
            }),
        );

        let c = ctx.clone();
        factories.insert(
            SchemeKind::AssemblyResource,
            Arc::new(move |scheme: &UrlScheme| -> Box<dyn SchemeHandler> {
                let resolver = scheme.assembly.clone().map(|options| {
                    BundleResolver::new(options).with_fallback(c.file_resolver(scheme))
                });
                Box::new(BundleSchemeHandler::new(resolver, c.errors.clone()))
            }),
        );

        let dispatcher = ctx.dispatcher.clone();
        factories.insert(
            SchemeKind::LocalRequest,
            Arc::new(move |_: &UrlScheme| -> Box<dyn SchemeHandler> {
                Box::new(RequestSchemeHandler::new(dispatcher.clone()))
            }),
        );

        let proxy = ctx.proxy;
        factories.insert(
            SchemeKind::ExternalRequest,
            Arc::new(move |_: &UrlScheme| -> Box<dyn SchemeHandler> {
                Box::new(ExternalRequestHandler::new(proxy.clone()))
            }),
        );

        Self { factories }
    }

    /// Replace the factory used for `kind`.
    pub fn with_factory(mut self, kind: SchemeKind, factory: Arc<dyn SchemeHandlerFactory>) -> Self {
        if kind.is_handled() {
            self.factories.insert(kind, factory);
        } else {
            tracing::warn!(kind = %kind, "Scheme kind never receives a handler, ignoring factory");
        }
        self
    }

    pub fn factory_for(&self, kind: SchemeKind) -> Option<Arc<dyn SchemeHandlerFactory>> {
        self.factories.get(&kind).cloned()
    }

    /// Register `scheme` and bind its kind's factory.
    pub fn register(&self, registry: &SchemeRegistry, scheme: UrlScheme) -> Result<(), RegistryError> {
        match self.factory_for(scheme.kind) {
            Some(factory) => registry.register_with_handler(scheme, factory),
            None => registry.register(scheme),
        }
    }

    /// Bind a factory to every registered scheme without one.
    /// Returns the number of schemes bound.
    pub fn bind_all(&self, registry: &SchemeRegistry) -> usize {
        let mut bound = 0;
        for (key, entry) in registry.snapshot().iter() {
            if entry.handler.is_some() {
                continue;
            }
            let Some(factory) = self.factory_for(entry.scheme.kind) else {
                continue;
            };
            match registry.bind_handler(key, factory) {
                Ok(()) => bound += 1,
                Err(e) => tracing::debug!(key = %key, error = %e, "Handler not bound"),
            }
        }
        tracing::debug!(bound, "Default handlers bound");
        bound
    }
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn `[[schemes]]` entries into registered, handler-bound schemes
//! - Load bundle directories for assembly schemes
//! - Assemble the pipeline, navigation policy and page binding
//!
//! # Design Decisions
//! - Fail fast: the initial scheme list must register cleanly
//! - Reloads only add schemes; a bad entry is logged and skipped
//! - Subsystems initialize in order: registry, handlers, pipeline

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::schema::{HostConfig, SchemeConfig};
use crate::handlers::{HandlerContext, HandlerProvider};
use crate::pipeline::runner::RequestPipeline;
use crate::proxy::{ProxyClient, ProxyError};
use crate::resource::MemoryBundle;
use crate::routing::{CommandTable, JsBinding, RouteDispatcher, RouteTable};
use crate::scheme::{AssemblyOptions, NavigationPolicy, RegistryError, SchemeRegistry, UrlScheme};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to load bundle {path}: {source}")]
    Bundle {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("startup requires a tokio runtime")]
    NoRuntime,
}

/// Build the scheme described by one config entry.
pub fn scheme_from_config(entry: &SchemeConfig) -> Result<UrlScheme, StartupError> {
    let mut scheme =
        UrlScheme::new(&entry.scheme, &entry.host, entry.kind).with_base_folder(&entry.base_folder);

    if let Some(assembly) = &entry.assembly {
        let bundle = MemoryBundle::load_dir(&assembly.namespace, &assembly.bundle_dir).map_err(
            |source| StartupError::Bundle {
                path: assembly.bundle_dir.display().to_string(),
                source,
            },
        )?;
        scheme = scheme.with_assembly(AssemblyOptions {
            namespace: assembly.namespace.clone(),
            root_folder: assembly.root_folder.clone(),
            bundle: Arc::new(bundle),
            allow_file_fallback: assembly.allow_file_fallback,
        });
    }
    Ok(scheme)
}

/// Every runtime component of a scheme host.
pub struct Host {
    pub registry: Arc<SchemeRegistry>,
    pub provider: HandlerProvider,
    pub pipeline: RequestPipeline,
    pub navigation: NavigationPolicy,
    pub binding: JsBinding,
}

impl Host {
    /// Assemble a host and register the configured schemes.
    ///
    /// Must run inside a tokio runtime; request work is spawned onto it.
    pub fn build(
        config: &HostConfig,
        registry: Arc<SchemeRegistry>,
        routes: RouteTable,
        commands: CommandTable,
    ) -> Result<Self, StartupError> {
        let runtime = Handle::try_current().map_err(|_| StartupError::NoRuntime)?;
        Self::build_with_provider(config, registry, routes, commands, runtime, |p| p)
    }

    /// Like [`Host::build`], letting the caller adjust the handler provider
    /// (e.g. override a kind's factory) before schemes are bound.
    pub fn build_with_provider(
        config: &HostConfig,
        registry: Arc<SchemeRegistry>,
        routes: RouteTable,
        commands: CommandTable,
        runtime: Handle,
        customize: impl FnOnce(HandlerProvider) -> HandlerProvider,
    ) -> Result<Self, StartupError> {
        let dispatcher = RouteDispatcher::new(Arc::new(routes));
        let commands = Arc::new(commands);
        let proxy = ProxyClient::new(&config.proxy)?;

        let ctx = HandlerContext::new(config.resources.root.clone(), dispatcher.clone(), proxy);
        let provider = customize(HandlerProvider::new(ctx));

        for entry in &config.schemes {
            provider.register(&registry, scheme_from_config(entry)?)?;
        }
        let bound = provider.bind_all(&registry);

        tracing::info!(
            schemes = registry.len(),
            late_bound = bound,
            routes = dispatcher.routes().len(),
            commands = commands.len(),
            "Scheme host ready"
        );

        Ok(Self {
            pipeline: RequestPipeline::new(registry.clone(), runtime),
            navigation: NavigationPolicy::new(registry.clone(), commands.clone()),
            binding: JsBinding::new(dispatcher, commands),
            registry,
            provider,
        })
    }

    /// Register schemes from a reloaded config that are not registered yet.
    /// Returns how many were added.
    pub fn apply_config(&self, config: &HostConfig) -> usize {
        let mut added = 0;
        for entry in &config.schemes {
            let key = crate::scheme::SchemeKey::new(&entry.scheme, &entry.host);
            if self.registry.is_key_registered(&key) {
                continue;
            }
            let result = scheme_from_config(entry)
                .and_then(|scheme| self.provider.register(&self.registry, scheme).map_err(Into::into));
            match result {
                Ok(()) => {
                    tracing::info!(key = %key, kind = %entry.kind, "Scheme added from reloaded config");
                    added += 1;
                }
                Err(e) => tracing::error!(key = %key, error = %e, "Failed to add scheme from reloaded config"),
            }
        }
        added
    }
}

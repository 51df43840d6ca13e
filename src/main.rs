//! scheme-host: serves registered URL schemes over a local HTTP bridge.
//!
//! # Architecture Overview
//!
//! ```text
//!     Bridge request /{scheme}/{host}/{*path}
//!     ─────────────────────────────────────────┐
//!                                              ▼
//!                      ┌──────────┐    ┌──────────────┐    ┌──────────────────┐
//!                      │   http   │───▶│   pipeline   │───▶│ scheme registry  │
//!                      │  bridge  │    │ begin/cancel │    │ scheme::host key │
//!                      └──────────┘    └──────┬───────┘    └──────────────────┘
//!                                             │ handler per request
//!                 ┌──────────────┬────────────┼──────────────┐
//!                 ▼              ▼            ▼              ▼
//!           ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐
//!           │ resource │  │  bundle  │  │  routes  │  │  proxy   │
//!           │   (fs)   │  │ (memory) │  │  (JSON)  │  │ (reqwest)│
//!           └──────────┘  └──────────┘  └──────────┘  └──────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use scheme_dispatch::config::{load_config, ConfigWatcher, HostConfig};
use scheme_dispatch::http::HttpServer;
use scheme_dispatch::lifecycle::{shutdown_signal, Host, Shutdown};
use scheme_dispatch::observability::{logging, metrics};
use scheme_dispatch::routing::{ApiResponse, CommandTable, RouteTable};
use scheme_dispatch::scheme::SchemeRegistry;

#[derive(Parser)]
#[command(name = "scheme-host")]
#[command(about = "Serve custom URL schemes through a local HTTP bridge", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `bridge.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Override `resources.root`.
    #[arg(short, long)]
    root: Option<PathBuf>,
}

fn builtin_routes(registry: Arc<SchemeRegistry>) -> RouteTable {
    let info_registry = registry.clone();
    RouteTable::new()
        .route("/info", move |_| {
            Ok(ApiResponse::ok(json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "schemes": info_registry.len(),
            })))
        })
        .route("/schemes", move |_| {
            let schemes: Vec<_> = registry
                .schemes()
                .iter()
                .map(|s| json!({"scheme": s.scheme, "host": s.host, "kind": s.kind}))
                .collect();
            Ok(ApiResponse::ok(json!(schemes)))
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bridge.bind_address = bind.to_string();
    }
    if let Some(root) = cli.root {
        config.resources.root = root;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "scheme-host starting");
    tracing::info!(
        bind_address = %config.bridge.bind_address,
        resource_root = ?config.resources.root,
        schemes = config.schemes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(SchemeRegistry::new());
    let commands = CommandTable::new().command("/log", |params| {
        tracing::info!(text = params.get("message").unwrap_or_default(), "Page log command");
    });
    let host = Arc::new(Host::build(
        &config,
        registry.clone(),
        builtin_routes(registry),
        commands,
    )?);

    let shutdown = Shutdown::new();

    // Hot reload: newly added schemes only.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let host = host.clone();
            let stop = shutdown.signalled();
            tokio::spawn(async move {
                tokio::pin!(stop);
                loop {
                    tokio::select! {
                        _ = &mut stop => break,
                        update = updates.recv() => match update {
                            Some(new_config) => {
                                let added = host.apply_config(&new_config);
                                tracing::info!(added, "Config reload applied");
                            }
                            None => break,
                        },
                    }
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.bridge.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.trigger();
        });
    }

    let server = HttpServer::new(config.bridge.clone(), host.pipeline.clone());
    server.run(listener, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

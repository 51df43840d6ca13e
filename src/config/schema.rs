//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the scheme
//! host. All types derive Serde traits for deserialization from config files.
//! Routes and commands are code-only and never appear here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scheme::SchemeKind;

/// Root configuration for the scheme host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// HTTP bridge settings.
    pub bridge: BridgeConfig,

    /// Filesystem resource settings.
    pub resources: ResourceConfig,

    /// Outbound HTTP client settings for external requests.
    pub proxy: ProxyClientConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Schemes registered at startup, in order.
    pub schemes: Vec<SchemeConfig>,
}

/// HTTP bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Whole-request timeout applied by the bridge.
    pub request_timeout_secs: u64,

    /// Grace period for in-flight requests on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Directory that `scheme://host/path` resolves under (as `root/host/path`).
    pub root: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyClientConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProxyClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info" or "scheme_dispatch=debug").
    /// `RUST_LOG` takes precedence when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// One `[[schemes]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchemeConfig {
    pub scheme: String,
    pub host: String,
    pub kind: SchemeKind,

    #[serde(default)]
    pub base_folder: String,

    /// Required for `assembly_resource` schemes.
    #[serde(default)]
    pub assembly: Option<AssemblyConfig>,
}

/// Bundle settings for an `assembly_resource` scheme.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssemblyConfig {
    pub namespace: String,

    #[serde(default)]
    pub root_folder: String,

    /// Directory loaded into the in-memory bundle at startup.
    pub bundle_dir: PathBuf,

    #[serde(default)]
    pub allow_file_fallback: bool,
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every error reported)
//!     → HostConfig (validated, immutable)
//!     → lifecycle::startup registers [[schemes]]
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new [[schemes]] entries are registered; existing keys stay as they are
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Routes and commands are registered in code, never from config

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AssemblyConfig, BridgeConfig, HostConfig, LogFormat, ObservabilityConfig, ProxyClientConfig,
    ResourceConfig, SchemeConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;

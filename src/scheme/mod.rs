//! Scheme subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     SchemeConfig[] / UrlScheme
//!     → registry.rs (first registration wins per scheme::host)
//!     → HandlerProvider binds a factory per kind
//!
//! Per navigation:
//!     URL → navigation.rs → Proceed | OpenExternal | RunCommand
//!
//! Per resource request:
//!     URL → registry.rs (key = scheme::host) → UrlScheme + handler factory
//! ```
//!
//! # Design Decisions
//! - Keys are case-insensitive
//! - Entries are immutable; registration is copy-on-write
//! - ExternalBrowser and Command schemes never get a handler

pub mod navigation;
pub mod registry;
pub mod url_scheme;

pub use navigation::{NavigationDecision, NavigationPolicy};
pub use registry::{RegistryError, SchemeEntry, SchemeRegistry};
pub use url_scheme::{AssemblyOptions, SchemeKey, SchemeKind, UrlScheme};

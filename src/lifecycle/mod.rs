//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     HostConfig → schemes registered + handlers bound → pipeline ready
//!
//! Shutdown (shutdown.rs):
//!     Signal received → bridge stops accepting → in-flight requests cancelled → drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then registry, then listeners
//! - Shutdown has a grace period: remaining requests are abandoned after it

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{scheme_from_config, Host, StartupError};

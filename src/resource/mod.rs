//! Static resource subsystem.
//!
//! # Data Flow
//! ```text
//! scheme://authority/path
//!     → file.rs    (root / authority / path → bytes + MIME)
//!     → bundle.rs  (namespace.root.path manifest name → bundle entry,
//!                   optional fallback to file.rs)
//!     → mime.rs    (extension → MIME type)
//!     → on failure: error_handler.rs (ResourceError → presentable response)
//! ```
//!
//! # Design Decisions
//! - Resolution is async and never touches the host thread
//! - Failures are values (ResourceError), never panics
//! - Presentation of failures is pluggable

use std::path::PathBuf;

use bytes::Bytes;

pub mod bundle;
pub mod error_handler;
pub mod file;
pub mod mime;

pub use bundle::{manifest_name, BundleResolver, MemoryBundle, ResourceBundle};
pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use file::FileResolver;
pub use mime::{MimeMapper, StaticMimeMap, DEFAULT_MIME};

/// A resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// Why a resource could not be served.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource is empty: {0}")]
    ZeroLength(String),

    #[error("bad resource request: {0}")]
    BadRequest(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

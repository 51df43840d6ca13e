//! Extension to MIME type lookup.

use std::path::Path;

pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Maps file extensions to MIME types.
pub trait MimeMapper: Send + Sync {
    /// MIME type for `extension` (with or without the leading dot).
    fn mime_type(&self, extension: &str) -> &str;

    fn mime_type_for_path(&self, path: &Path) -> &str {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.mime_type(ext),
            None => DEFAULT_MIME,
        }
    }
}

/// Extension lookup backed by the `mime_guess` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMimeMap;

impl MimeMapper for StaticMimeMap {
    fn mime_type(&self, extension: &str) -> &str {
        mime_guess::from_ext(extension.trim_start_matches('.'))
            .first_raw()
            .unwrap_or(DEFAULT_MIME)
    }
}

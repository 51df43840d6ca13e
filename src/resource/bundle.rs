//! Embedded resource bundles.
//!
//! # Responsibilities
//! - Address bundle entries by manifest name (`namespace.root.path.file.ext`)
//! - Serve bundle entries, falling back to the filesystem when allowed
//!
//! # Design Decisions
//! - Bundles are in-memory maps; build them from `include_bytes!` tables or
//!   load a directory once at startup
//! - An empty entry counts as missing

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::resource::file::FileResolver;
use crate::resource::mime::{MimeMapper, StaticMimeMap};
use crate::resource::{Resource, ResourceError};
use crate::scheme::url_scheme::AssemblyOptions;

/// Read-only collection of named resources.
pub trait ResourceBundle: Send + Sync {
    fn get(&self, name: &str) -> Option<Bytes>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Manifest name for a URL path inside a bundle.
///
/// Segments are joined with `.`, path separators become `.`, and doubled dots
/// produced by empty segments are collapsed.
pub fn manifest_name(namespace: &str, root_folder: &str, path: &str) -> String {
    let path = path.replace('/', ".");
    [namespace, root_folder, path.as_str()]
        .join(".")
        .replace("..", ".")
        .replace("..", ".")
}

/// Bundle backed by a hash map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    entries: HashMap<String, Bytes>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a static table, e.g. of `include_bytes!` entries.
    pub fn from_static(entries: &[(&'static str, &'static [u8])]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(name, data)| (name.to_string(), Bytes::from_static(*data)))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Bytes>) {
        self.entries.insert(name.into(), data.into());
    }

    /// Load every file under `dir`, naming entries `namespace.relative.path`.
    pub fn load_dir(namespace: &str, dir: &Path) -> std::io::Result<Self> {
        let mut bundle = Self::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            for entry in std::fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                let name = manifest_name(namespace, "", &relative);
                bundle.insert(name, std::fs::read(&path)?);
            }
        }

        tracing::info!(namespace = %namespace, dir = ?dir, entries = bundle.len(), "Resource bundle loaded");
        Ok(bundle)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ResourceBundle for MemoryBundle {
    fn get(&self, name: &str) -> Option<Bytes> {
        self.entries.get(name).cloned()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Resolves URLs against a bundle.
#[derive(Clone)]
pub struct BundleResolver {
    options: AssemblyOptions,
    fallback: Option<FileResolver>,
    mime: Arc<dyn MimeMapper>,
}

impl BundleResolver {
    pub fn new(options: AssemblyOptions) -> Self {
        Self {
            options,
            fallback: None,
            mime: Arc::new(StaticMimeMap),
        }
    }

    /// Filesystem resolver used when `allow_file_fallback` is set.
    pub fn with_fallback(mut self, fallback: FileResolver) -> Self {
        self.mime = fallback.mime_mapper().clone();
        self.fallback = Some(fallback);
        self
    }

    pub fn manifest_name_for(&self, url: &Url) -> String {
        let path = percent_decode_str(url.path()).decode_utf8_lossy();
        manifest_name(&self.options.namespace, &self.options.root_folder, &path)
    }

    pub async fn resolve(&self, url: &Url) -> Result<Resource, ResourceError> {
        let name = self.manifest_name_for(url);

        if let Some(bytes) = self.options.bundle.get(&name).filter(|b| !b.is_empty()) {
            tracing::trace!(manifest = %name, size = bytes.len(), "Bundle entry found");
            return Ok(Resource {
                bytes,
                mime_type: self.mime.mime_type_for_path(Path::new(url.path())).to_string(),
            });
        }

        match &self.fallback {
            Some(fallback) if self.options.allow_file_fallback => {
                tracing::debug!(manifest = %name, "Bundle entry missing, reading from filesystem");
                fallback.resolve(url).await
            }
            _ => Err(ResourceError::NotFound(name)),
        }
    }
}

//! Filesystem resolver.
//!
//! # Responsibilities
//! - Map `scheme://authority/path` to `root/authority/path`
//! - Distinguish missing, empty and unreadable files
//! - Read the whole file and pick a MIME type from its extension
//!
//! # Design Decisions
//! - `..` components are rejected before touching the filesystem
//! - URL paths are percent-decoded

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::resource::mime::{MimeMapper, StaticMimeMap};
use crate::resource::{Resource, ResourceError};

#[derive(Clone)]
pub struct FileResolver {
    root: PathBuf,
    mime: Arc<dyn MimeMapper>,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mime: Arc::new(StaticMimeMap),
        }
    }

    pub fn with_mime_mapper(mut self, mime: Arc<dyn MimeMapper>) -> Self {
        self.mime = mime;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mime_mapper(&self) -> &Arc<dyn MimeMapper> {
        &self.mime
    }

    /// Filesystem path a URL maps to.
    pub fn path_for(&self, url: &Url) -> Result<PathBuf, ResourceError> {
        let decoded = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|_| ResourceError::BadRequest(format!("path is not valid UTF-8: {}", url.path())))?;
        let relative = Path::new(decoded.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(ResourceError::BadRequest(format!(
                "path escapes resource root: {}",
                url.path()
            )));
        }

        let mut path = self.root.clone();
        if let Some(authority) = url.host_str().filter(|h| !h.is_empty()) {
            path.push(authority);
        }
        path.push(relative);
        Ok(path)
    }

    /// Resolve `url` to file content.
    pub async fn resolve(&self, url: &Url) -> Result<Resource, ResourceError> {
        let path = self.path_for(url)?;
        let display = path.display().to_string();

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(ResourceError::NotFound(display)),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ResourceError::NotFound(display)),
            Err(source) => return Err(ResourceError::Io { path, source }),
        };
        if metadata.len() == 0 {
            return Err(ResourceError::ZeroLength(display));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ResourceError::Io { path: path.clone(), source })?;
        if bytes.is_empty() {
            return Err(ResourceError::ZeroLength(display));
        }

        Ok(Resource {
            bytes: Bytes::from(bytes),
            mime_type: self.mime.mime_type_for_path(&path).to_string(),
        })
    }
}

impl std::fmt::Debug for FileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResolver").field("root", &self.root).finish()
    }
}

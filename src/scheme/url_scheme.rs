//! Scheme descriptors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::resource::bundle::ResourceBundle;

/// What a registered scheme is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// Files on the local filesystem.
    Resource,
    /// Entries of an embedded resource bundle.
    AssemblyResource,
    /// JSON routes served by the application.
    LocalRequest,
    /// Requests proxied to a real HTTP endpoint.
    ExternalRequest,
    /// Navigations handed to the system browser.
    ExternalBrowser,
    /// Fire-and-forget command URLs.
    Command,
}

impl SchemeKind {
    /// Whether requests for this kind go through a scheme handler.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            SchemeKind::Resource
                | SchemeKind::AssemblyResource
                | SchemeKind::LocalRequest
                | SchemeKind::ExternalRequest
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::Resource => "resource",
            SchemeKind::AssemblyResource => "assembly_resource",
            SchemeKind::LocalRequest => "local_request",
            SchemeKind::ExternalRequest => "external_request",
            SchemeKind::ExternalBrowser => "external_browser",
            SchemeKind::Command => "command",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry key: `scheme::host`, both lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemeKey {
    scheme: String,
    host: String,
}

impl SchemeKey {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
        }
    }

    /// Derive the key from a URL's scheme and host.
    pub fn from_url(url: &Url) -> Self {
        Self::new(url.scheme(), url.host_str().unwrap_or_default())
    }

    /// Parse `url` and derive its key. Unparseable URLs yield `None`.
    pub fn parse(url: &str) -> Option<Self> {
        if url.trim().is_empty() {
            return None;
        }
        Url::parse(url).ok().map(|u| Self::from_url(&u))
    }
}

impl fmt::Display for SchemeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scheme, self.host)
    }
}

/// Options for schemes served from an embedded bundle.
#[derive(Clone)]
pub struct AssemblyOptions {
    /// Leading segment of every manifest name (e.g. the crate or app name).
    pub namespace: String,
    /// Folder inside the bundle the URL paths are relative to.
    pub root_folder: String,
    pub bundle: Arc<dyn ResourceBundle>,
    /// Read from the filesystem when the bundle has no matching entry.
    pub allow_file_fallback: bool,
}

impl fmt::Debug for AssemblyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyOptions")
            .field("namespace", &self.namespace)
            .field("root_folder", &self.root_folder)
            .field("bundle_entries", &self.bundle.len())
            .field("allow_file_fallback", &self.allow_file_fallback)
            .finish()
    }
}

/// A registered URL scheme. Immutable once registered.
#[derive(Debug, Clone)]
pub struct UrlScheme {
    pub scheme: String,
    pub host: String,
    pub base_folder: String,
    pub kind: SchemeKind,
    pub assembly: Option<AssemblyOptions>,
}

impl UrlScheme {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, kind: SchemeKind) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            base_folder: String::new(),
            kind,
            assembly: None,
        }
    }

    pub fn with_base_folder(mut self, base_folder: impl Into<String>) -> Self {
        self.base_folder = base_folder.into();
        self
    }

    pub fn with_assembly(mut self, options: AssemblyOptions) -> Self {
        self.assembly = Some(options);
        self
    }

    pub fn key(&self) -> SchemeKey {
        SchemeKey::new(&self.scheme, &self.host)
    }

    /// Whether `url` belongs to this scheme.
    pub fn matches(&self, url: &Url) -> bool {
        SchemeKey::from_url(url) == self.key()
    }
}

//! Scheme registry.
//!
//! # Responsibilities
//! - Map `scheme::host` keys to scheme descriptors and handler factories
//! - Resolve a URL to its registered scheme
//!
//! # Design Decisions
//! - First registration wins; later ones for the same key are ignored
//! - Readers load an immutable snapshot without locking
//! - Writers serialize on a mutex, copy the map, and publish a new snapshot
//! - A request keeps the snapshot it started with; late registrations are not
//!   visible to it

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use url::Url;

use crate::pipeline::handler::SchemeHandlerFactory;
use crate::scheme::url_scheme::{SchemeKey, UrlScheme};

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("scheme {0} is already registered")]
    AlreadyExists(SchemeKey),

    #[error("scheme {0} already has a handler")]
    AlreadyBound(SchemeKey),

    #[error("scheme {0} is not registered")]
    NotRegistered(SchemeKey),
}

/// A registry entry.
#[derive(Clone)]
pub struct SchemeEntry {
    pub scheme: Arc<UrlScheme>,
    pub handler: Option<Arc<dyn SchemeHandlerFactory>>,
}

impl std::fmt::Debug for SchemeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeEntry")
            .field("scheme", &self.scheme)
            .field("bound", &self.handler.is_some())
            .finish()
    }
}

type EntryMap = HashMap<SchemeKey, SchemeEntry>;

/// Registry of custom URL schemes.
pub struct SchemeRegistry {
    entries: ArcSwap<EntryMap>,
    write_lock: Mutex<()>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register a scheme without a handler.
    pub fn register(&self, scheme: UrlScheme) -> Result<(), RegistryError> {
        self.insert(scheme, None)
    }

    /// Register a scheme together with its handler factory.
    pub fn register_with_handler(
        &self,
        scheme: UrlScheme,
        handler: Arc<dyn SchemeHandlerFactory>,
    ) -> Result<(), RegistryError> {
        self.insert(scheme, Some(handler))
    }

    fn insert(
        &self,
        scheme: UrlScheme,
        handler: Option<Arc<dyn SchemeHandlerFactory>>,
    ) -> Result<(), RegistryError> {
        let key = scheme.key();
        self.update(|map| {
            if map.contains_key(&key) {
                tracing::debug!(key = %key, "Scheme already registered, keeping first registration");
                return Err(RegistryError::AlreadyExists(key.clone()));
            }
            tracing::debug!(key = %key, kind = %scheme.kind, bound = handler.is_some(), "Scheme registered");
            map.insert(
                key.clone(),
                SchemeEntry {
                    scheme: Arc::new(scheme),
                    handler,
                },
            );
            Ok(())
        })
    }

    /// Attach a handler factory to an already registered scheme.
    pub fn bind_handler(
        &self,
        key: &SchemeKey,
        handler: Arc<dyn SchemeHandlerFactory>,
    ) -> Result<(), RegistryError> {
        self.update(|map| match map.get_mut(key) {
            None => Err(RegistryError::NotRegistered(key.clone())),
            Some(entry) if entry.handler.is_some() => Err(RegistryError::AlreadyBound(key.clone())),
            Some(entry) => {
                entry.handler = Some(handler);
                Ok(())
            }
        })
    }

    /// Copy-on-write update under the writer lock.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut EntryMap) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = EntryMap::clone(&self.entries.load());
        let out = f(&mut next)?;
        self.entries.store(Arc::new(next));
        Ok(out)
    }

    /// Current immutable view of every entry.
    pub fn snapshot(&self) -> Arc<HashMap<SchemeKey, SchemeEntry>> {
        self.entries.load_full()
    }

    pub fn entry(&self, key: &SchemeKey) -> Option<SchemeEntry> {
        self.entries.load().get(key).cloned()
    }

    pub fn entry_for_url(&self, url: &Url) -> Option<SchemeEntry> {
        self.entry(&SchemeKey::from_url(url))
    }

    /// Scheme registered for `url`, if any.
    pub fn lookup(&self, url: &str) -> Option<Arc<UrlScheme>> {
        let key = SchemeKey::parse(url)?;
        self.entry(&key).map(|e| e.scheme)
    }

    /// Handler factory bound to the scheme for `url`, if any.
    pub fn handler_for(&self, url: &str) -> Option<Arc<dyn SchemeHandlerFactory>> {
        let key = SchemeKey::parse(url)?;
        self.entry(&key).and_then(|e| e.handler)
    }

    pub fn is_registered(&self, url: &str) -> bool {
        SchemeKey::parse(url)
            .map(|key| self.is_key_registered(&key))
            .unwrap_or(false)
    }

    pub fn is_key_registered(&self, key: &SchemeKey) -> bool {
        self.entries.load().contains_key(key)
    }

    /// All registered schemes.
    pub fn schemes(&self) -> Vec<Arc<UrlScheme>> {
        let mut schemes: Vec<_> = self
            .entries
            .load()
            .values()
            .map(|e| e.scheme.clone())
            .collect();
        schemes.sort_by_key(|s| s.key());
        schemes
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler::{HandlerError, SchemeHandler};
    use crate::pipeline::request::SchemeRequest;
    use crate::pipeline::response::SchemeResponse;
    use crate::scheme::url_scheme::SchemeKind;
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    struct Fixed(&'static str);

    #[async_trait]
    impl SchemeHandler for Fixed {
        async fn process(
            &mut self,
            _request: SchemeRequest,
            _cancel: CancellationToken,
        ) -> Result<Option<SchemeResponse>, HandlerError> {
            Ok(Some(SchemeResponse::ok("text/plain", self.0)))
        }
    }

    fn factory(tag: &'static str) -> Arc<dyn SchemeHandlerFactory> {
        Arc::new(move |_: &UrlScheme| Box::new(Fixed(tag)) as Box<dyn SchemeHandler>)
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = SchemeRegistry::new();
        let first = UrlScheme::new("local", "dist", SchemeKind::Resource).with_base_folder("first");
        let second = UrlScheme::new("LOCAL", "dist", SchemeKind::Resource).with_base_folder("second");

        assert!(registry.register_with_handler(first, factory("first")).is_ok());
        assert_eq!(
            registry.register_with_handler(second, factory("second")),
            Err(RegistryError::AlreadyExists(SchemeKey::new("local", "dist")))
        );

        let scheme = registry.lookup("local://dist/index.html").unwrap();
        assert_eq!(scheme.base_folder, "first");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_returns_first_handler() {
        let registry = SchemeRegistry::new();
        let _ = registry.register_with_handler(
            UrlScheme::new("app", "api", SchemeKind::LocalRequest),
            factory("first"),
        );
        let _ = registry.register_with_handler(
            UrlScheme::new("app", "api", SchemeKind::LocalRequest),
            factory("second"),
        );

        let scheme = registry.lookup("app://api/x").unwrap();
        let mut handler = registry.handler_for("app://api/x").unwrap().create(&scheme);
        let resp = handler
            .process(SchemeRequest::get("app://api/x").unwrap(), CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resp.body_bytes().as_ref(), b"first");
    }

    #[test]
    fn test_bind_handler() {
        let registry = SchemeRegistry::new();
        let key = SchemeKey::new("app", "api");

        assert_eq!(
            registry.bind_handler(&key, factory("x")).err(),
            Some(RegistryError::NotRegistered(key.clone()))
        );

        registry
            .register(UrlScheme::new("app", "api", SchemeKind::LocalRequest))
            .unwrap();
        assert!(registry.handler_for("app://api/").is_none());
        assert!(registry.bind_handler(&key, factory("x")).is_ok());
        assert_eq!(
            registry.bind_handler(&key, factory("y")).err(),
            Some(RegistryError::AlreadyBound(key))
        );
        assert!(registry.handler_for("app://api/").is_some());
    }

    #[test]
    fn test_unknown_and_invalid_urls() {
        let registry = SchemeRegistry::new();
        registry
            .register(UrlScheme::new("local", "dist", SchemeKind::Resource))
            .unwrap();

        assert!(registry.lookup("local://other/index.html").is_none());
        assert!(registry.lookup("::::").is_none());
        assert!(!registry.is_registered(""));
        assert!(registry.is_registered("LOCAL://DIST/a.js"));
    }

    #[test]
    fn test_snapshot_not_affected_by_late_registration() {
        let registry = SchemeRegistry::new();
        registry
            .register(UrlScheme::new("local", "dist", SchemeKind::Resource))
            .unwrap();
        let snapshot = registry.snapshot();

        registry
            .register(UrlScheme::new("app", "api", SchemeKind::LocalRequest))
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}

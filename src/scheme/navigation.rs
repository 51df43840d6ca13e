//! Navigation policy.
//!
//! Decides, before a navigation starts, whether the host should load the URL
//! itself, hand it to the system browser, or treat it as a command.

use std::sync::Arc;

use url::Url;

use crate::routing::command::CommandTable;
use crate::scheme::registry::SchemeRegistry;
use crate::scheme::url_scheme::SchemeKind;

/// What the host should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Load normally (possibly through a scheme handler).
    Proceed,
    /// Open in the system browser; the host performs the launch.
    OpenExternal(Url),
    /// Command URL; already dispatched, the navigation must be suppressed.
    RunCommand(Url),
}

impl NavigationDecision {
    /// Whether the host must suppress its own navigation.
    pub fn suppresses_navigation(&self) -> bool {
        !matches!(self, NavigationDecision::Proceed)
    }
}

pub struct NavigationPolicy {
    registry: Arc<SchemeRegistry>,
    commands: Arc<CommandTable>,
}

impl NavigationPolicy {
    pub fn new(registry: Arc<SchemeRegistry>, commands: Arc<CommandTable>) -> Self {
        Self { registry, commands }
    }

    /// Classify a navigation without side effects.
    pub fn classify(&self, url: &str) -> NavigationDecision {
        let Ok(parsed) = Url::parse(url) else {
            return NavigationDecision::Proceed;
        };
        match self.registry.entry_for_url(&parsed).map(|e| e.scheme.kind) {
            Some(SchemeKind::ExternalBrowser) => NavigationDecision::OpenExternal(parsed),
            Some(SchemeKind::Command) => NavigationDecision::RunCommand(parsed),
            _ => NavigationDecision::Proceed,
        }
    }

    /// Classify a navigation and dispatch command URLs.
    pub fn before_browse(&self, url: &str) -> NavigationDecision {
        let decision = self.classify(url);
        match &decision {
            NavigationDecision::RunCommand(url) => {
                self.commands.run(url);
            }
            NavigationDecision::OpenExternal(url) => {
                tracing::info!(url = %url, "Navigation delegated to external browser");
            }
            NavigationDecision::Proceed => {}
        }
        decision
    }
}

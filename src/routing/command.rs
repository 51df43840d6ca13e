//! Fire-and-forget commands addressed by URL path.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use url::Url;

use crate::pipeline::request::QueryParams;

type CommandFn = dyn Fn(QueryParams) + Send + Sync;

#[derive(Clone, Default)]
pub struct CommandTable {
    commands: HashMap<String, Arc<CommandFn>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. The first registration of a path wins.
    pub fn command<F>(mut self, path: &str, f: F) -> Self
    where
        F: Fn(QueryParams) + Send + Sync + 'static,
    {
        let path = format!("/{}", path.trim_start_matches('/'));
        if self.commands.contains_key(&path) {
            tracing::warn!(path = %path, "Command already registered, ignoring");
        } else {
            self.commands.insert(path, Arc::new(f));
        }
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.commands
            .contains_key(&format!("/{}", path.trim_start_matches('/')))
    }

    /// Start the command named by the URL path.
    ///
    /// Returns false when no command matches. The command runs on the blocking
    /// pool when a runtime is available, otherwise on a detached thread.
    pub fn run(&self, url: &Url) -> bool {
        let path = url.path();
        let Some(command) = self.commands.get(path).cloned() else {
            tracing::warn!(url = %url, "Unknown command, ignoring");
            return false;
        };

        let params = QueryParams::from_url(url);
        tracing::info!(command = %path, "Running command");

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || command(params));
            }
            Err(_) => {
                std::thread::spawn(move || command(params));
            }
        }
        true
    }

    /// Parse `url` and run it.
    pub fn run_str(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(url) => self.run(&url),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Invalid command URL");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_run_passes_params() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let table = CommandTable::new().command("/showdevtools", move |params| {
            let _ = tx.send(params.get("tab").map(str::to_string));
        });

        assert!(table.run_str("http://command.com/showdevtools?tab=console"));
        assert_eq!(rx.recv().await.unwrap().as_deref(), Some("console"));
    }

    #[tokio::test]
    async fn test_unknown_command_ignored() {
        let table = CommandTable::new().command("/known", |_| {});

        assert!(!table.run_str("http://command.com/unknown"));
        assert!(!table.run_str("not a url"));
        assert!(table.contains("known"));
    }

    #[test]
    fn test_run_without_runtime() {
        let (tx, rx) = std::sync::mpsc::channel();
        let table = CommandTable::new().command("/ping", move |_| {
            let _ = tx.send(());
        });

        assert!(table.run_str("http://command.com/ping"));
        rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
    }
}

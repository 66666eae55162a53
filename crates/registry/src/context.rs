use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

use crate::reducer::{reduce, Command};
use crate::widget::Registry;

/// Committed view of the shared state: the registry plus connection config.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub registry: Registry,
    pub base_url: String,
    pub headers: Vec<(String, String)>,
}

/// Single source of truth for one mounted widget tree.
///
/// Explicitly constructed and passed by handle to every consumer; never a
/// process-wide singleton. Dropping the context tears the tree's state down.
/// All mutation is serialized through [`SearchContext::dispatch`], which
/// commits a fresh registry (read-copy-update) and publishes the new
/// snapshot before returning, so a subscriber's next read is never stale.
pub struct SearchContext {
    registry: Mutex<Registry>,
    tx: watch::Sender<Snapshot>,
    base_url: String,
    headers: Vec<(String, String)>,
    stamp: AtomicU64,
}

impl SearchContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_headers(base_url, Vec::new())
    }

    pub fn with_headers(base_url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        let base_url = base_url.into();
        let (tx, _rx) = watch::channel(Snapshot {
            registry: Registry::new(),
            base_url: base_url.clone(),
            headers: headers.clone(),
        });
        Self {
            registry: Mutex::new(Registry::new()),
            tx,
            base_url,
            headers,
            stamp: AtomicU64::new(0),
        }
    }

    /// Apply a command and publish the committed snapshot.
    pub fn dispatch(&self, command: Command) {
        let mut registry = self.registry.lock().expect("registry mutex poisoned");
        let next = reduce(&registry, command);
        *registry = next.clone();
        drop(registry);

        log::debug!("registry committed: {} widgets", next.len());
        // send_replace publishes even with no subscribers attached yet.
        self.tx.send_replace(Snapshot {
            registry: next,
            base_url: self.base_url.clone(),
            headers: self.headers.clone(),
        });
    }

    /// Current committed state.
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Watch every committed transition. The receiver always holds the
    /// latest snapshot; intermediate commits may be coalesced for a slow
    /// reader, which matches the tolerance consumers must already have.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Strictly increasing submission stamp, independent of wall-clock
    /// resolution so two submissions never coalesce.
    pub fn next_stamp(&self) -> u64 {
        self.stamp.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetState;
    use pretty_assertions::assert_eq;

    #[test]
    fn dispatch_commits_before_returning() {
        let context = SearchContext::new("http://localhost:8000");
        context.dispatch(Command::SetWidget(WidgetState::new("search")));
        assert!(context.snapshot().registry.contains_key("search"));
    }

    #[test]
    fn subscriber_sees_the_committed_snapshot() {
        let context = SearchContext::new("http://localhost:8000");
        let rx = context.subscribe();
        context.dispatch(Command::SetWidget(WidgetState::new("facet")));
        assert!(rx.borrow().registry.contains_key("facet"));
    }

    #[tokio::test]
    async fn subscriber_is_woken_on_commit() {
        let context = std::sync::Arc::new(SearchContext::new("http://localhost:8000"));
        let mut rx = context.subscribe();

        let publisher = context.clone();
        let handle = tokio::spawn(async move {
            publisher.dispatch(Command::SetWidget(WidgetState::new("search")));
        });

        rx.changed().await.expect("sender alive");
        assert!(rx.borrow().registry.contains_key("search"));
        handle.await.unwrap();
    }

    #[test]
    fn old_snapshots_are_not_edited_in_place() {
        let context = SearchContext::new("http://localhost:8000");
        context.dispatch(Command::SetWidget(WidgetState::new("a")));
        let before = context.snapshot();
        context.dispatch(Command::DeleteWidget("a".into()));
        assert!(before.registry.contains_key("a"));
        assert!(!context.snapshot().registry.contains_key("a"));
    }

    #[test]
    fn stamps_strictly_increase() {
        let context = SearchContext::new("http://localhost:8000");
        let first = context.next_stamp();
        let second = context.next_stamp();
        assert!(second > first);
    }

    #[test]
    fn headers_travel_with_the_snapshot() {
        let context = SearchContext::with_headers(
            "http://localhost:8000",
            vec![("authorization".into(), "Bearer t".into())],
        );
        assert_eq!(
            context.snapshot().headers,
            vec![("authorization".to_string(), "Bearer t".to_string())]
        );
    }
}

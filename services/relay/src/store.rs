//! Thread-safe in-memory event storage.
//!
//! Events are layered across a primary `id -> Event` map and a secondary
//! `(created_at, id) -> ()` index so `query` can walk stored events
//! newest-first without scanning in insertion order. Author/kind predicates
//! are applied as a filter over that ordered walk rather than as their own
//! indexes — conformant, not maximally fast.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use nostr_proto::{matches, Event, Filter};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    by_id: HashMap<String, Event>,
    by_time: BTreeMap<(i64, String), ()>,
}

/// Unbounded in-memory store; eviction and persistence are out of scope.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Inserts `event` iff no event with the same id is already present.
    /// Returns `false` on duplicate without touching the stored copy.
    pub async fn add(&self, event: Event) -> bool {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&event.id) {
            return false;
        }
        inner
            .by_time
            .insert((event.created_at, event.id.clone()), ());
        inner.by_id.insert(event.id.clone(), event);
        true
    }

    pub async fn get(&self, id: &str) -> Option<Event> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// Returns every stored event matching `filter`, newest-first. Does not
    /// apply `filter.limit` — callers cap the REQ-time scan themselves so
    /// live broadcast is never limited.
    pub async fn query(&self, filter: &Filter) -> Vec<Event> {
        let inner = self.inner.read().await;
        inner
            .by_time
            .keys()
            .rev()
            .filter_map(|(_, id)| inner.by_id.get(id))
            .filter(|event| matches(event, filter))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, created_at: i64, kind: u64) -> Event {
        Event {
            id: id.to_owned(),
            pubkey: "aa".repeat(32),
            created_at,
            kind,
            tags: vec![],
            content: String::new(),
            sig: "0".repeat(128),
        }
    }

    #[tokio::test]
    async fn add_rejects_duplicate_id() {
        let store = EventStore::new();
        assert!(store.add(event("e1", 0, 1)).await);
        assert!(!store.add(event("e1", 0, 1)).await);
    }

    #[tokio::test]
    async fn get_returns_the_stored_copy() {
        let store = EventStore::new();
        store.add(event("e1", 10, 1)).await;
        let fetched = store.get("e1").await.expect("present");
        assert_eq!(fetched.created_at, 10);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn query_returns_newest_first() {
        let store = EventStore::new();
        store.add(event("old", 1, 1)).await;
        store.add(event("new", 2, 1)).await;
        store.add(event("newest", 3, 1)).await;
        let ids: Vec<String> = store
            .query(&Filter::default())
            .await
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["newest", "new", "old"]);
    }

    #[tokio::test]
    async fn query_applies_the_filter() {
        let store = EventStore::new();
        store.add(event("a", 0, 1)).await;
        store.add(event("b", 0, 7)).await;
        let filter = Filter {
            kinds: Some(vec![7]),
            ..Default::default()
        };
        let matched = store.query(&filter).await;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "b");
    }

    #[tokio::test]
    async fn query_ignores_limit() {
        let store = EventStore::new();
        store.add(event("a", 0, 1)).await;
        store.add(event("b", 1, 1)).await;
        let filter = Filter {
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(store.query(&filter).await.len(), 2);
    }
}

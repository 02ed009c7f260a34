//! Per-connection state: subscriptions and the outbound write queue.

use std::collections::{HashMap, VecDeque};

use nostr_proto::{Filter, RelayMessage};
use tokio::sync::{Mutex, Notify};

/// Per-client map of subscription id to its filter set.
///
/// Guarded by a single mutex held only long enough to install, remove, or
/// snapshot — never across an outbound write.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subs: Mutex<HashMap<String, Vec<Filter>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing subscription with the same id.
    pub async fn install(&self, sub_id: String, filters: Vec<Filter>) {
        self.subs.lock().await.insert(sub_id, filters);
    }

    /// No-op if `sub_id` is not installed.
    pub async fn remove(&self, sub_id: &str) {
        self.subs.lock().await.remove(sub_id);
    }

    /// A snapshot suitable for broadcast matching; taken under the lock,
    /// then released before any filter matching or write happens.
    pub async fn snapshot(&self) -> Vec<(String, Vec<Filter>)> {
        self.subs
            .lock()
            .await
            .iter()
            .map(|(id, filters)| (id.clone(), filters.clone()))
            .collect()
    }
}

/// A bounded outbound frame queue with a drop-oldest backpressure policy.
///
/// A full queue evicts the oldest queued `EVENT` frame to make room for the
/// new frame, preferring to keep control frames (`OK`/`EOSE`/`NOTICE`)
/// intact; if the queue holds no `EVENT` frame, the oldest frame of any kind
/// is dropped instead. Producers (the Hub's broadcast path, and this
/// connection's own reply path) never block on a slow reader.
pub struct OutboundQueue {
    capacity: usize,
    queue: Mutex<VecDeque<RelayMessage>>,
    notify: Notify,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
        }
    }

    pub async fn push(&self, message: RelayMessage) {
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.capacity {
            let oldest_event = queue
                .iter()
                .position(|m| matches!(m, RelayMessage::Event { .. }));
            match oldest_event {
                Some(index) => {
                    queue.remove(index);
                }
                None => {
                    queue.pop_front();
                }
            }
        }
        queue.push_back(message);
        drop(queue);
        self.notify.notify_one();
    }

    /// Drains whatever is currently queued without waiting for it to be
    /// non-empty. Used where a caller needs a non-blocking snapshot (tests,
    /// and the writer task's final flush on shutdown).
    pub async fn try_drain(&self) -> Vec<RelayMessage> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Waits for at least one queued frame, then drains and returns all of
    /// them in enqueue order.
    pub async fn drain(&self) -> Vec<RelayMessage> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.queue.lock().await;
                if !queue.is_empty() {
                    return queue.drain(..).collect();
                }
            }
            notified.await;
        }
    }
}

//! Global client registry and broadcast fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nostr_proto::{matches_any, Event, RelayMessage};
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{OutboundQueue, SubscriptionRegistry};

/// Opaque per-connection identity, assigned at registration time.
pub type ClientId = u64;

/// The per-client state the Hub needs to reach a connection: its
/// subscriptions and its outbound queue. The connection handler owns the
/// same `Arc`s and uses them to install/remove subscriptions and to drain
/// the queue from its writer task.
pub struct ClientHandle {
    pub subscriptions: Arc<SubscriptionRegistry>,
    pub outbound: Arc<OutboundQueue>,
}

/// Owns the live client set. Registration and broadcast are serialized
/// through the registry's own async lock; the registry is never mutated
/// from the broadcast path.
#[derive(Clone)]
pub struct RelayHub {
    clients: Arc<RwLock<HashMap<ClientId, ClientHandle>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayHub {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registers a new connection and returns its id and outbound queue
    /// handle, for use by its writer task.
    pub async fn register(&self, outbound_queue_capacity: usize) -> (ClientId, Arc<ClientHandle>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(ClientHandle {
            subscriptions: Arc::new(SubscriptionRegistry::new()),
            outbound: Arc::new(OutboundQueue::new(outbound_queue_capacity)),
        });
        self.clients.write().await.insert(
            id,
            ClientHandle {
                subscriptions: handle.subscriptions.clone(),
                outbound: handle.outbound.clone(),
            },
        );
        (id, handle)
    }

    pub async fn unregister(&self, id: ClientId) {
        self.clients.write().await.remove(&id);
    }

    /// Snapshots the client set and, for each client, its subscriptions;
    /// enqueues at most one `EVENT` frame per subscription whose filter set
    /// matches. Never awaits an outbound write directly against a slow
    /// client — `OutboundQueue::push` only ever locks its own queue.
    pub async fn broadcast(&self, event: &Event) {
        let clients: Vec<(ClientId, Arc<SubscriptionRegistry>, Arc<OutboundQueue>)> = {
            let guard = self.clients.read().await;
            guard
                .iter()
                .map(|(id, handle)| {
                    (
                        *id,
                        Arc::clone(&handle.subscriptions),
                        Arc::clone(&handle.outbound),
                    )
                })
                .collect()
        };

        for (client_id, subscriptions, outbound) in clients {
            for (sub_id, filters) in subscriptions.snapshot().await {
                if matches_any(event, &filters) {
                    debug!(client_id, sub_id = %sub_id, event_id = %event.id, "broadcast match");
                    outbound
                        .push(RelayMessage::Event {
                            subscription_id: sub_id,
                            event: Box::new(event.clone()),
                        })
                        .await;
                }
            }
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

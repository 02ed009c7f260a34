//! The per-connection state machine: upgrade, read loop, and writer task.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use nostr_proto::{validate, ClientMessage, Event, MessageParseError, RelayMessage};
use tracing::{debug, info, warn};

use crate::hub::ClientHandle;
use crate::http::plain_get_response;
use crate::state::RelayState;

/// Transport-level failure on a connection. Unlike [`nostr_proto::MessageParseError`]
/// and [`nostr_proto::ValidationError`], which are recoverable and produce a reply
/// frame, every variant here tears the connection down.
#[derive(Debug, thiserror::Error)]
enum RelayError {
    #[error("websocket read/write error: {0}")]
    Socket(#[from] axum::Error),
    #[error("peer closed the connection")]
    PeerClosed,
}

/// Outbound frames queued per connection before the writer task falls
/// behind and starts dropping the oldest `EVENT` frame.
const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// The cap applied to a REQ's initial historical scan when the client
/// supplies no `limit` on any filter — `query` itself never truncates, so
/// an unbounded REQ would otherwise replay the entire store.
const DEFAULT_SCAN_LIMIT: usize = 5000;

/// Handles `GET /`: a WebSocket upgrade request is dispatched to the
/// connection state machine; a plain GET falls through to the NIP-11-ish
/// info document, matching real relays that serve both from one path.
pub async fn root(
    ws: Option<WebSocketUpgrade>,
    headers: HeaderMap,
    State(state): State<RelayState>,
) -> Response {
    match ws {
        Some(ws) => ws
            .on_upgrade(move |socket| handle_connection(socket, state))
            .into_response(),
        None => plain_get_response(&headers, &state.relay_name, &state.relay_description).into_response(),
    }
}

async fn handle_connection(socket: WebSocket, state: RelayState) {
    let (client_id, handle) = state.hub.register(OUTBOUND_QUEUE_CAPACITY).await;
    info!(client_id, "client connected");

    let (mut sink, mut stream) = socket.split();

    let writer_outbound = handle.outbound.clone();
    let mut writer = tokio::spawn(async move {
        loop {
            let frames = writer_outbound.drain().await;
            for frame in frames {
                if sink.send(Message::Text(frame.to_json().into())).await.is_err() {
                    return;
                }
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        process_text(&text, client_id, &handle, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(client_id, error = %RelayError::PeerClosed, "client disconnected");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(client_id, error = %RelayError::from(e), "websocket error");
                        break;
                    }
                }
            }
            _ = &mut writer => {
                break;
            }
        }
    }

    writer.abort();
    state.hub.unregister(client_id).await;
    debug!(client_id, "client state torn down");
}

/// Parses and dispatches one inbound text frame. Protocol-level errors
/// always recover locally (§7): this never closes the connection.
async fn process_text(text: &str, client_id: u64, handle: &ClientHandle, state: &RelayState) {
    let message = match ClientMessage::from_json(text) {
        Ok(m) => m,
        Err(MessageParseError::UnknownType(tag)) => {
            handle
                .outbound
                .push(RelayMessage::notice(format!("error: unknown message type: {tag}")))
                .await;
            return;
        }
        Err(e) => {
            handle
                .outbound
                .push(RelayMessage::notice(format!("error: could not parse command: {e}")))
                .await;
            return;
        }
    };

    match message {
        ClientMessage::Event(event) => handle_event(event, client_id, handle, state).await,
        ClientMessage::Req {
            subscription_id,
            filters,
        } => handle_req(subscription_id, filters, handle, state).await,
        ClientMessage::Close { subscription_id } => {
            handle.subscriptions.remove(&subscription_id).await;
            debug!(client_id, sub_id = %subscription_id, "subscription closed");
        }
    }
}

async fn handle_event(event: Event, client_id: u64, handle: &ClientHandle, state: &RelayState) {
    if let Err(e) = validate(&event) {
        debug!(client_id, event_id = %event.id, error = %e, "event rejected");
        handle
            .outbound
            .push(RelayMessage::ok(event.id.clone(), false, e.to_string()))
            .await;
        return;
    }

    let event_id = event.id.clone();
    let inserted = state.store.add(event.clone()).await;
    if inserted {
        info!(client_id, event_id = %event_id, "event accepted");
        handle
            .outbound
            .push(RelayMessage::ok(event_id.clone(), true, ""))
            .await;
        state.hub.broadcast(&event).await;
    } else {
        debug!(client_id, event_id = %event_id, "duplicate event");
        handle
            .outbound
            .push(RelayMessage::ok(event_id.clone(), true, "duplicate"))
            .await;
    }
}

async fn handle_req(
    subscription_id: String,
    filters: Vec<nostr_proto::Filter>,
    handle: &ClientHandle,
    state: &RelayState,
) {
    // Installed before the historical scan so a concurrent broadcast that
    // lands mid-scan is still delivered to this subscription, never lost in
    // the window between scan completion and registration.
    handle
        .subscriptions
        .install(subscription_id.clone(), filters.clone())
        .await;

    let limit = filters
        .iter()
        .filter_map(|f| f.limit)
        .min()
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_SCAN_LIMIT);

    let mut seen = std::collections::HashSet::new();
    let mut emitted = 0usize;
    'filters: for filter in &filters {
        for event in state.store.query(filter).await {
            if emitted >= limit {
                break 'filters;
            }
            if !seen.insert(event.id.clone()) {
                continue;
            }
            handle
                .outbound
                .push(RelayMessage::Event {
                    subscription_id: subscription_id.clone(),
                    event: Box::new(event),
                })
                .await;
            emitted += 1;
        }
    }

    handle
        .outbound
        .push(RelayMessage::Eose {
            subscription_id: subscription_id.clone(),
        })
        .await;
}

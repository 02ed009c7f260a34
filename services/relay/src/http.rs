//! Ambient HTTP surface: liveness/readiness probes and a NIP-11-flavored
//! root info document, served from the same router as the WS upgrade.

use axum::http::header::ACCEPT;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

const NOSTR_JSON_ACCEPT: &str = "application/nostr+json";

pub async fn healthz() -> impl IntoResponse {
    "ok"
}

pub async fn readyz() -> impl IntoResponse {
    "ok"
}

#[derive(Serialize)]
struct RelayInfo {
    name: String,
    description: String,
    supported_nips: Vec<u32>,
}

/// Renders the non-upgrade response for `GET /`: the NIP-11-flavored info
/// document when the client asked for `application/nostr+json`, a plain
/// banner otherwise. Called from [`crate::ws::root`] once it has determined
/// the request is not a WebSocket upgrade.
pub fn plain_get_response(headers: &HeaderMap, relay_name: &str, relay_description: &str) -> impl IntoResponse {
    let wants_nip11 = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == NOSTR_JSON_ACCEPT);

    if wants_nip11 {
        Json(RelayInfo {
            name: relay_name.to_owned(),
            description: relay_description.to_owned(),
            supported_nips: vec![1],
        })
        .into_response()
    } else {
        format!("{relay_name} — a Nostr relay. Connect over WebSocket.").into_response()
    }
}

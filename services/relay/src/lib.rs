pub mod client;
pub mod config;
pub mod hub;
pub mod http;
pub mod state;
pub mod store;
pub mod ws;

pub use state::RelayState;

use axum::routing::get;
use axum::Router;

/// Composes the WebSocket upgrade route and the ambient HTTP surface behind
/// one router with shared state, so integration tests and the binary serve
/// the exact same routes.
pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(ws::root))
        .route("/healthz", get(http::healthz))
        .route("/readyz", get(http::readyz))
        .with_state(state)
}

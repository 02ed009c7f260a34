//! Wire types and validation for the Nostr relay's client protocol.
//!
//! This crate is transport-agnostic: it knows how to parse and serialize
//! NIP-01 frames, compute and verify event identity, and match events
//! against filters, but nothing about WebSockets, connection state, or
//! storage.

mod canonical;
mod event;
mod filter;
mod message;

pub use canonical::canonical_bytes;
pub use event::{validate, Event, UnsignedEvent, ValidationError};
pub use filter::{matches, matches_any, Filter};
pub use message::{ClientMessage, MessageParseError, RelayMessage};

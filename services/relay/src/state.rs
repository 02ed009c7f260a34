//! The shared application state threaded through axum's `State` extractor.

use crate::config::Config;
use crate::hub::RelayHub;
use crate::store::EventStore;

#[derive(Clone)]
pub struct RelayState {
    pub hub: RelayHub,
    pub store: EventStore,
    pub relay_name: String,
    pub relay_description: String,
}

impl RelayState {
    pub fn new(config: &Config) -> Self {
        Self {
            hub: RelayHub::new(),
            store: EventStore::new(),
            relay_name: config.relay_name.clone(),
            relay_description: config.relay_description.clone(),
        }
    }
}

//! Startup configuration, read once from the environment in `main`.

use std::env;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_RELAY_NAME: &str = "relay";
const DEFAULT_RELAY_DESCRIPTION: &str = "a Nostr relay";

pub struct Config {
    pub bind_addr: String,
    pub log_level: String,
    pub relay_name: String,
    pub relay_description: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned()),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_owned()),
            relay_name: env::var("RELAY_NAME").unwrap_or_else(|_| DEFAULT_RELAY_NAME.to_owned()),
            relay_description: env::var("RELAY_DESCRIPTION")
                .unwrap_or_else(|_| DEFAULT_RELAY_DESCRIPTION.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_constants() {
        // Constructed directly rather than through from_env to avoid
        // depending on/mutating process-global environment state in tests.
        let cfg = Config {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            log_level: "info".to_owned(),
            relay_name: DEFAULT_RELAY_NAME.to_owned(),
            relay_description: DEFAULT_RELAY_DESCRIPTION.to_owned(),
        };
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
    }
}

//! Client and relay wire messages.
//!
//! NIP-01 frames are JSON arrays with a leading string tag, not a tagged
//! object, so these types carry their own `Serialize`/`Deserialize` impls
//! built on `serde_json::Value` rather than deriving `#[serde(tag = "kind")]`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::event::Event;
use crate::filter::Filter;

/// A frame sent by a client connection.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    Event(Event),
    Req {
        subscription_id: String,
        filters: Vec<Filter>,
    },
    Close {
        subscription_id: String,
    },
}

/// A frame sent by the relay to a client connection.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    Eose {
        subscription_id: String,
    },
    Notice {
        message: String,
    },
}

impl RelayMessage {
    pub fn ok(event_id: impl Into<String>, accepted: bool, message: impl Into<String>) -> Self {
        Self::Ok {
            event_id: event_id.into(),
            accepted,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessageParseError {
    #[error("frame is not a JSON array")]
    NotAnArray,
    #[error("frame array is empty")]
    Empty,
    #[error("unknown client frame type {0:?}")]
    UnknownType(String),
    #[error("{0} frame has the wrong shape")]
    WrongShape(&'static str),
    #[error("REQ frame carries no filters")]
    NoFilters,
    #[error("failed to decode field: {0}")]
    Json(#[from] serde_json::Error),
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ClientMessage::from_value(value).map_err(D::Error::custom)
    }
}

impl ClientMessage {
    fn from_value(value: Value) -> Result<Self, MessageParseError> {
        let Value::Array(mut items) = value else {
            return Err(MessageParseError::NotAnArray);
        };
        if items.is_empty() {
            return Err(MessageParseError::Empty);
        }
        let tag = items
            .remove(0)
            .as_str()
            .ok_or(MessageParseError::WrongShape("frame"))?
            .to_owned();

        match tag.as_str() {
            "EVENT" => {
                if items.len() != 1 {
                    return Err(MessageParseError::WrongShape("EVENT"));
                }
                let event: Event = serde_json::from_value(items.remove(0))?;
                Ok(ClientMessage::Event(event))
            }
            "REQ" => {
                if items.is_empty() {
                    return Err(MessageParseError::WrongShape("REQ"));
                }
                let subscription_id = items
                    .remove(0)
                    .as_str()
                    .ok_or(MessageParseError::WrongShape("REQ"))?
                    .to_owned();
                if items.is_empty() {
                    return Err(MessageParseError::NoFilters);
                }
                let filters = items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<Filter>, _>>()?;
                Ok(ClientMessage::Req {
                    subscription_id,
                    filters,
                })
            }
            "CLOSE" => {
                if items.len() != 1 {
                    return Err(MessageParseError::WrongShape("CLOSE"));
                }
                let subscription_id = items
                    .remove(0)
                    .as_str()
                    .ok_or(MessageParseError::WrongShape("CLOSE"))?
                    .to_owned();
                Ok(ClientMessage::Close { subscription_id })
            }
            other => Err(MessageParseError::UnknownType(other.to_owned())),
        }
    }

    /// Parses a single text WebSocket frame into a client message.
    pub fn from_json(text: &str) -> Result<Self, MessageParseError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }
}

impl Serialize for RelayMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = match self {
            RelayMessage::Event {
                subscription_id,
                event,
            } => serde_json::json!(["EVENT", subscription_id, event]),
            RelayMessage::Ok {
                event_id,
                accepted,
                message,
            } => serde_json::json!(["OK", event_id, accepted, message]),
            RelayMessage::Eose { subscription_id } => serde_json::json!(["EOSE", subscription_id]),
            RelayMessage::Notice { message } => serde_json::json!(["NOTICE", message]),
        };
        value.serialize(serializer)
    }
}

impl RelayMessage {
    /// Renders the frame to the exact JSON text written to the socket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("RelayMessage always serializes")
    }
}

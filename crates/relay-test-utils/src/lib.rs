//! A minimal WebSocket client for driving a relay in integration tests.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::tungstenite::protocol::Message;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct MockRelayClient {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
}

impl MockRelayClient {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = ws_stream.split();
        Ok(Self { write, read })
    }

    /// Sends a raw text frame, bypassing `ClientMessage` construction, for
    /// exercising malformed-frame handling.
    pub async fn send_raw(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.write.send(Message::Text(text.to_owned().into())).await?;
        Ok(())
    }

    pub async fn send(&mut self, msg: &ClientSend<'_>) -> Result<(), Box<dyn std::error::Error>> {
        self.send_raw(&msg.to_json()).await
    }

    /// Receives the next text frame and parses it as a relay frame. Skips
    /// ping/pong control frames; errors on an unexpected close.
    pub async fn recv(&mut self) -> Result<ParsedRelayMessage, Box<dyn std::error::Error>> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => return Ok(ParsedRelayMessage::parse(&text)?),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) => return Err("connection closed by server".into()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err("connection stream ended".into()),
            }
        }
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}

/// Frames a test can ask the client to send, mirroring NIP-01's three
/// client-originated frame types without requiring a constructed `Event` to
/// already be valid (so malformed-frame tests can still use this type).
pub enum ClientSend<'a> {
    Event(&'a nostr_proto::Event),
    Req {
        subscription_id: &'a str,
        filters: &'a [nostr_proto::Filter],
    },
    Close {
        subscription_id: &'a str,
    },
}

impl ClientSend<'_> {
    fn to_json(&self) -> String {
        match self {
            ClientSend::Event(event) => {
                serde_json::to_string(&serde_json::json!(["EVENT", event])).unwrap()
            }
            ClientSend::Req {
                subscription_id,
                filters,
            } => {
                let mut arr = vec![serde_json::json!("REQ"), serde_json::json!(subscription_id)];
                arr.extend(filters.iter().map(|f| serde_json::to_value(f).unwrap()));
                serde_json::to_string(&arr).unwrap()
            }
            ClientSend::Close { subscription_id } => {
                serde_json::to_string(&serde_json::json!(["CLOSE", subscription_id])).unwrap()
            }
        }
    }
}

/// A relay frame the client parsed from the wire, downgraded from
/// `nostr_proto::RelayMessage`'s variant shape into owned fields so tests
/// can assert on it without importing the parse error type.
#[derive(Debug, Clone)]
pub enum ParsedRelayMessage {
    Event {
        subscription_id: String,
        event: Box<nostr_proto::Event>,
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

impl ParsedRelayMessage {
    fn parse(text: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let arr = value.as_array().ok_or("relay frame is not a JSON array")?;
        let tag = arr.first().and_then(|v| v.as_str()).ok_or("missing frame tag")?;
        match tag {
            "EVENT" => {
                let subscription_id = arr
                    .get(1)
                    .and_then(|v| v.as_str())
                    .ok_or("EVENT frame missing subscription id")?
                    .to_owned();
                let event: nostr_proto::Event = serde_json::from_value(
                    arr.get(2).ok_or("EVENT frame missing event body")?.clone(),
                )?;
                Ok(ParsedRelayMessage::Event {
                    subscription_id,
                    event: Box::new(event),
                })
            }
            "OK" => Ok(ParsedRelayMessage::Ok {
                event_id: arr.get(1).and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
                accepted: arr.get(2).and_then(|v| v.as_bool()).unwrap_or(false),
                message: arr.get(3).and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
            }),
            "EOSE" => Ok(ParsedRelayMessage::Eose {
                subscription_id: arr.get(1).and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
            }),
            "NOTICE" => Ok(ParsedRelayMessage::Notice {
                message: arr.get(1).and_then(|v| v.as_str()).unwrap_or_default().to_owned(),
            }),
            other => Err(format!("unknown relay frame type {other:?}").into()),
        }
    }
}

//! Native relay sessions (NIP-01 over WebSocket).
//!
//! A session is owned by exactly one task at a time; queries against it are
//! issued and drained sequentially, so no locking is involved.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use nihao_primitives::address::PeerAddress;
use nihao_primitives::event::{Event, Filter};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("relay closed the connection")]
    Disconnected,

    #[error("subscription closed by relay: {0}")]
    SubscriptionClosed(String),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Something that can answer "what is the newest event matching this filter".
#[async_trait]
pub trait DocumentSource: Send {
    fn address(&self) -> &PeerAddress;

    /// Newest matching event held by this source, `None` when it holds none.
    async fn latest(&mut self, filter: &Filter) -> Result<Option<Event>, SessionError>;

    /// Release the underlying connection.
    async fn close(&mut self);
}

/// Opens sessions to relays.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: DocumentSource;

    async fn connect(&self, address: &PeerAddress) -> Result<Self::Session, SessionError>;
}

/// Messages a relay may send.
#[derive(Clone, Debug, PartialEq)]
pub enum RelayMessage {
    Event { subscription: String, event: Box<Event> },
    EndOfStored { subscription: String },
    Closed { subscription: String, reason: String },
    Notice(String),
    /// Anything this client does not act upon (OK, AUTH, COUNT, garbage).
    Other,
}

impl RelayMessage {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Array(mut parts)) = serde_json::from_str::<Value>(text) else {
            return Self::Other;
        };

        let label = parts.first().and_then(Value::as_str).map(str::to_owned);
        let subscription = parts
            .get(1)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_default();

        match label.as_deref() {
            Some("EVENT") if parts.len() >= 3 => {
                match serde_json::from_value::<Event>(parts.swap_remove(2)) {
                    Ok(event) => Self::Event {
                        subscription,
                        event: Box::new(event),
                    },
                    Err(_) => Self::Other,
                }
            }
            Some("EOSE") => Self::EndOfStored { subscription },
            Some("CLOSED") => Self::Closed {
                subscription,
                reason: parts
                    .get(2)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            },
            Some("NOTICE") => Self::Notice(subscription),
            _ => Self::Other,
        }
    }
}

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live WebSocket connection to one relay.
pub struct RelaySession {
    address: PeerAddress,
    stream: Stream,
    next_subscription: u64,
    closed: bool,
}

impl fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySession")
            .field("address", &self.address)
            .field("next_subscription", &self.next_subscription)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl RelaySession {
    /// Perform the WebSocket handshake, bounded by `limit`.
    pub async fn connect(address: &PeerAddress, limit: Duration) -> Result<Self, SessionError> {
        let (stream, _response) = timeout(limit, connect_async(address.as_str()))
            .await
            .map_err(|_| SessionError::Timeout(limit))??;

        Ok(Self {
            address: address.clone(),
            stream,
            next_subscription: 0,
            closed: false,
        })
    }

    /// All stored events matching `filter`, up to the relay's end-of-stored marker.
    pub async fn query(&mut self, filter: &Filter) -> Result<Vec<Event>, SessionError> {
        self.next_subscription += 1;
        let subscription = format!("nihao-{}", self.next_subscription);

        let request = json!(["REQ", subscription, filter]);
        self.stream
            .send(Message::Text(serde_json::to_string(&request)?))
            .await?;

        let mut events = Vec::new();

        loop {
            let Some(message) = self.stream.next().await else {
                return Err(SessionError::Disconnected);
            };

            let text = match message? {
                Message::Text(text) => text,
                Message::Close(_) => return Err(SessionError::Disconnected),
                _ => continue,
            };

            match RelayMessage::parse(&text) {
                RelayMessage::Event {
                    subscription: sub,
                    event,
                } if sub == subscription => {
                    if filter.matches(&event) {
                        events.push(*event);
                    }
                }
                RelayMessage::EndOfStored { subscription: sub } if sub == subscription => break,
                RelayMessage::Closed {
                    subscription: sub,
                    reason,
                } if sub == subscription => {
                    return Err(SessionError::SubscriptionClosed(reason));
                }
                RelayMessage::Notice(notice) => {
                    debug!(address = %self.address, %notice, "Relay notice");
                }
                // leftovers of an abandoned earlier subscription
                _ => {}
            }
        }

        let close = json!(["CLOSE", subscription]);
        self.stream
            .send(Message::Text(serde_json::to_string(&close)?))
            .await?;

        Ok(events)
    }
}

#[async_trait]
impl DocumentSource for RelaySession {
    fn address(&self) -> &PeerAddress {
        &self.address
    }

    async fn latest(&mut self, filter: &Filter) -> Result<Option<Event>, SessionError> {
        let events = self.query(filter).await?;

        Ok(events.into_iter().max_by_key(|event| event.created_at))
    }

    async fn close(&mut self) {
        self.closed = true;

        if let Err(err) = self.stream.close(None).await {
            debug!(address = %self.address, error = %err, "Unclean session close");
        }
    }
}

impl Drop for RelaySession {
    fn drop(&mut self) {
        if !self.closed {
            debug!(address = %self.address, "Session dropped without a close handshake");
        }
    }
}

/// Connects over WebSocket with a fixed handshake timeout.
#[derive(Clone, Copy, Debug)]
pub struct WsConnector {
    timeout: Duration,
}

impl WsConnector {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Session = RelaySession;

    async fn connect(&self, address: &PeerAddress) -> Result<RelaySession, SessionError> {
        RelaySession::connect(address, self.timeout).await
    }
}

//! In-process relay speaking NIP-11 over HTTP and NIP-01 over WebSocket on a
//! single port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityDocument;
use nihao_primitives::event::{Event, Filter};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Clone, Debug, Default)]
pub struct MockRelay {
    pub document: Option<CapabilityDocument>,
    pub events: Vec<Event>,
    /// Delay before answering each REQ.
    pub reply_delay: Duration,
}

impl MockRelay {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            document: Some(CapabilityDocument {
                name: "mock".to_owned(),
                supported_nips: vec![1, 11],
                ..CapabilityDocument::default()
            }),
            events,
            reply_delay: Duration::ZERO,
        }
    }

    /// Serve on an ephemeral local port until the test runtime shuts down.
    pub async fn spawn(self) -> PeerAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/", get(root))
            .with_state(Arc::new(self));

        drop(tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        }));

        address_of(local)
    }
}

fn address_of(local: SocketAddr) -> PeerAddress {
    format!("ws://{local}").parse().unwrap()
}

/// Address of a port nothing listens on.
pub async fn closed_address() -> PeerAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local = listener.local_addr().unwrap();
    drop(listener);

    address_of(local)
}

async fn root(
    ws: Option<WebSocketUpgrade>,
    headers: HeaderMap,
    State(relay): State<Arc<MockRelay>>,
) -> Response {
    if let Some(ws) = ws {
        return ws.on_upgrade(move |socket| serve_socket(socket, relay));
    }

    let wants_document = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/nostr+json"));

    match (&relay.document, wants_document) {
        (Some(document), true) => (
            [(header::CONTENT_TYPE, "application/nostr+json")],
            serde_json::to_string(document).unwrap(),
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve_socket(mut socket: WebSocket, relay: Arc<MockRelay>) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };

        let Ok(Value::Array(parts)) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        if parts.first().and_then(Value::as_str) != Some("REQ") {
            continue;
        }

        let subscription = parts.get(1).cloned().unwrap_or(Value::Null);
        let filter: Filter = parts
            .get(2)
            .cloned()
            .and_then(|raw| serde_json::from_value(raw).ok())
            .unwrap_or_default();

        sleep(relay.reply_delay).await;

        for event in relay.events.iter().filter(|event| filter.matches(event)) {
            let reply = json!(["EVENT", subscription, event]).to_string();
            if socket.send(Message::Text(reply)).await.is_err() {
                return;
            }
        }

        let eose = json!(["EOSE", subscription]).to_string();
        if socket.send(Message::Text(eose)).await.is_err() {
            return;
        }
    }
}

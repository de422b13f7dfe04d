//! Optional WebSocket embedding built on `tokio-tungstenite`.
//!
//! The engine itself is synchronous and transport-agnostic; this module
//! provides the canonical async embedding: a [`WsTransport`] that queues
//! outgoing payloads, and a driver loop that pumps socket events and a
//! periodic tick into the client on a single task.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::connection::StompClient;
use crate::transport::{Transport, TransportError, TransportEvent};

/// Outbound half of the WebSocket binding. Payloads handed to `send` are
/// queued for the driver loop to write to the socket.
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl WsTransport {
    /// Create the transport plus the receiver the driver loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { outbound: tx }, rx)
    }
}

impl Transport for WsTransport {
    fn open(
        &mut self,
        _host: &str,
        _port: u16,
        _path: &str,
        _use_tls: bool,
    ) -> Result<(), TransportError> {
        // connection establishment belongs to the driver loop
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.outbound
            .send(payload.to_vec())
            .map_err(|_| TransportError::Closed("driver loop gone".into()))
    }
}

/// Compose the socket URL for a client from its configuration, including
/// session-wrapper path segments when wrapper mode is enabled.
pub fn websocket_url(client: &mut StompClient<WsTransport>) -> String {
    let scheme = if client.config().use_tls { "wss" } else { "ws" };
    let host = client.config().host.clone();
    let port = client.config().port;
    let path = client.socket_path();
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    };
    format!("{scheme}://{host}:{port}{path}")
}

/// Connect the socket and drive the client until the connection closes.
///
/// `on_idle` runs after every tick so the embedder can issue subscribe and
/// send calls from the same thread of control that owns the client.
pub async fn drive<F>(
    client: &mut StompClient<WsTransport>,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    tick_interval: Duration,
    mut on_idle: F,
) -> Result<(), TransportError>
where
    F: FnMut(&mut StompClient<WsTransport>),
{
    let url = websocket_url(client);
    debug!(%url, "connecting websocket");
    let (socket, _) = connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Closed(e.to_string()))?;
    let (mut sink, mut stream) = socket.split();

    let _ = client.on_transport_event(TransportEvent::Connected);
    let mut tick = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            maybe = outbound.recv() => match maybe {
                Some(payload) => {
                    let text = String::from_utf8_lossy(&payload).into_owned();
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            item = stream.next() => match item {
                Some(Ok(Message::Text(text))) => {
                    let _ = client
                        .on_transport_event(TransportEvent::TextReceived(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    let _ = client.on_transport_event(TransportEvent::TextReceived(data.to_vec()));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            },
            _ = tick.tick() => {
                let _ = client.tick();
                on_idle(client);
            }
        }
    }

    let _ = client.on_transport_event(TransportEvent::Disconnected);
    Ok(())
}

//! Synchronous STOMP client engine for WebSocket and SockJS-style
//! transports.
//!
//! The crate multiplexes any number of logical subscriptions over one
//! transport connection: frame encoding/decoding, the connection lifecycle
//! state machine, subscription bookkeeping and message routing,
//! acknowledgement dispatch, and heartbeat negotiation.
//!
//! The transport itself stays outside: the engine pushes bytes out through
//! the [`Transport`] contract and is fed [`TransportEvent`]s plus a periodic
//! [`StompClient::tick`] by the embedder. There are no internal threads, no
//! locks, and no async suspension points in the core; the optional
//! `websocket` feature adds a `tokio-tungstenite` embedding.
//!
//! ```no_run
//! use cobalt_stomp::{AckDecision, AckMode, StompClient, StompConfig};
//! # use cobalt_stomp::transport::{Transport, TransportError, TransportEvent};
//! # struct MyTransport;
//! # impl Transport for MyTransport {
//! #     fn open(&mut self, _: &str, _: u16, _: &str, _: bool) -> Result<(), TransportError> { Ok(()) }
//! #     fn send(&mut self, _: &[u8]) -> Result<(), TransportError> { Ok(()) }
//! # }
//! # fn main() -> Result<(), cobalt_stomp::ClientError> {
//! let config = StompConfig::new("broker.example.com", 15674, "/ws").login("guest");
//! let mut client = StompClient::new(MyTransport, config);
//! client.on_connect(|frame| println!("connected: {frame}"));
//! client.connect()?;
//! // ... transport wiring delivers events:
//! client.on_transport_event(TransportEvent::Connected)?;
//! client.subscribe("/queue/orders", AckMode::Client, |message| {
//!     println!("got: {}", message.body);
//!     AckDecision::Ack
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod frame;
pub mod heartbeat;
pub mod subscription;
pub mod transport;
#[cfg(feature = "websocket")]
pub mod ws;

pub use codec::ParseError;
pub use config::StompConfig;
pub use connection::{ClientError, ConnectionState, StompClient};
pub use frame::{Command, Frame};
pub use heartbeat::{Heartbeat, parse_heartbeat_header};
pub use subscription::{AckDecision, AckMode, RegistryFull, SubscriptionRegistry};
pub use transport::{Clock, PathRng, SystemClock, Transport, TransportError, TransportEvent};

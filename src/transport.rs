//! The transport contract and the ambient capabilities (clock, RNG) the
//! engine depends on.
//!
//! The engine never owns a socket: it pushes bytes out through [`Transport`]
//! and is fed [`TransportEvent`]s by whatever drives the connection.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use thiserror::Error;

/// Errors surfaced by a transport implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport closed: {0}")]
    Closed(String),
}

/// Events the transport layer delivers into the engine. All three arrive on
/// the same logical thread of control as the embedder's `tick` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The underlying connection is up.
    Connected,
    /// The underlying connection went away.
    Disconnected,
    /// One transport message worth of bytes arrived.
    TextReceived(Vec<u8>),
}

/// The outbound half of the transport contract.
pub trait Transport {
    /// Initiate a connection to `host:port` at `path`.
    fn open(&mut self, host: &str, port: u16, path: &str, use_tls: bool)
    -> Result<(), TransportError>;

    /// Send one transport message.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

/// Wall-clock capability, injected so heartbeat timing is deterministic
/// under test.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// System clock: milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Random-number capability for session-wrapper path segments.
pub trait PathRng {
    /// Uniform value in `0..bound`.
    fn next_below(&mut self, bound: u32) -> u32;
}

/// Default [`PathRng`] backed by the thread-local generator.
pub struct ThreadPathRng(rand::rngs::ThreadRng);

impl ThreadPathRng {
    pub fn new() -> Self {
        Self(rand::thread_rng())
    }
}

impl Default for ThreadPathRng {
    fn default() -> Self {
        Self::new()
    }
}

impl PathRng for ThreadPathRng {
    fn next_below(&mut self, bound: u32) -> u32 {
        self.0.gen_range(0..bound)
    }
}

/// Session-wrapper bootstrap path: `<base>/<0-999>/<0-999999>/websocket`.
///
/// The wrapper protocol expects a numeric server id and a per-session id as
/// extra path segments before the `websocket` suffix.
pub fn session_path(base: &str, rng: &mut dyn PathRng) -> String {
    let base = base.trim_end_matches('/');
    let server_id = rng.next_below(1_000);
    let session_id = rng.next_below(1_000_000);
    format!("{base}/{server_id}/{session_id}/websocket")
}

//! Connection lifecycle state machine and the client facade that composes
//! the codec, subscription registry, and heartbeat scheduler over one
//! transport connection.

use bytes::BytesMut;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::codec::{self, SessionPulse};
use crate::config::StompConfig;
use crate::frame::{Command, Frame};
use crate::heartbeat::Heartbeat;
use crate::subscription::{AckDecision, AckMode, RegistryFull, SubscriptionRegistry};
use crate::transport::{
    Clock, PathRng, SystemClock, ThreadPathRng, Transport, TransportError, TransportEvent,
    session_path,
};

/// Connection lifecycle phase. Exactly one value holds at any time;
/// transitions are driven by transport events and inbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Opening,
    Connected,
    Disconnecting,
}

/// Errors surfaced by the client facade.
///
/// Protocol-level noise never shows up here; malformed or unexpected input
/// is dropped to preserve session liveness. What remains is transport
/// failure and subscription capacity exhaustion.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Full(#[from] RegistryFull),
}

/// Callback invoked on lifecycle frames (CONNECTED, RECEIPT, ERROR).
pub type StateHandler = Box<dyn FnMut(&Frame)>;

const ACCEPT_VERSION: &str = "1.1,1.0";

#[derive(Default)]
struct Callbacks {
    connect: Option<StateHandler>,
    disconnect: Option<StateHandler>,
    receipt: Option<StateHandler>,
    error: Option<StateHandler>,
}

/// STOMP client engine: one instance per transport connection.
///
/// The client owns no thread and no socket. It is advanced by exactly two
/// external stimuli on the same logical thread of control: transport events
/// fed to [`on_transport_event`](Self::on_transport_event), and a periodic
/// [`tick`](Self::tick) from the embedder's loop. Frame dispatch, registry
/// lookup, and handler invocation all run synchronously to completion
/// before control returns.
pub struct StompClient<T: Transport> {
    transport: T,
    config: StompConfig,
    clock: Box<dyn Clock>,
    rng: Box<dyn PathRng>,
    state: ConnectionState,
    registry: SubscriptionRegistry,
    heartbeat: Heartbeat,
    callbacks: Callbacks,
    command_count: u64,
    server_pulses: u64,
}

impl<T: Transport> StompClient<T> {
    /// Build a client with the system clock and thread-local RNG.
    pub fn new(transport: T, config: StompConfig) -> Self {
        Self::with_parts(
            transport,
            config,
            Box::new(SystemClock),
            Box::new(ThreadPathRng::new()),
        )
    }

    /// Build a client with explicit clock and RNG capabilities, making
    /// heartbeat timing and session paths deterministic under test.
    pub fn with_parts(
        transport: T,
        config: StompConfig,
        clock: Box<dyn Clock>,
        rng: Box<dyn PathRng>,
    ) -> Self {
        let now = clock.now_millis();
        let registry = SubscriptionRegistry::new(config.subscription_capacity);
        let heartbeat = Heartbeat::new(config.preferred_heartbeat_ms, now);
        Self {
            transport,
            config,
            clock,
            rng,
            state: ConnectionState::Disconnected,
            registry,
            heartbeat,
            callbacks: Callbacks::default(),
            command_count: 0,
            server_pulses: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &StompConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Count of outgoing payloads (frames and heartbeats) so far. Seeds the
    /// `receipt` header on DISCONNECT.
    pub fn commands_sent(&self) -> u64 {
        self.command_count
    }

    /// Count of heartbeat pulses received from the server, wrapper-level or
    /// bare-newline.
    pub fn server_pulses(&self) -> u64 {
        self.server_pulses
    }

    /// The negotiated outgoing heartbeat interval; `0` until a CONNECTED
    /// frame negotiates one.
    pub fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat.interval_ms()
    }

    /// Register the connect callback, fired once per transition into
    /// `Connected`.
    pub fn on_connect(&mut self, handler: impl FnMut(&Frame) + 'static) {
        self.callbacks.connect = Some(Box::new(handler));
    }

    /// Register the disconnect callback, fired when the session ends via
    /// ERROR or a receipt-completed DISCONNECT.
    pub fn on_disconnect(&mut self, handler: impl FnMut(&Frame) + 'static) {
        self.callbacks.disconnect = Some(Box::new(handler));
    }

    /// Register the receipt callback, fired for every RECEIPT frame.
    pub fn on_receipt(&mut self, handler: impl FnMut(&Frame) + 'static) {
        self.callbacks.receipt = Some(Box::new(handler));
    }

    /// Register the error callback, fired for ERROR frames.
    pub fn on_error(&mut self, handler: impl FnMut(&Frame) + 'static) {
        self.callbacks.error = Some(Box::new(handler));
    }

    /// The path the transport should open: the configured base path, with
    /// random session-wrapper segments appended when wrapper mode is on.
    pub fn socket_path(&mut self) -> String {
        if self.config.session_wrapper {
            session_path(&self.config.path, self.rng.as_mut())
        } else {
            self.config.path.clone()
        }
    }

    /// Initiate the transport connection using the configured TLS setting.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        let use_tls = self.config.use_tls;
        self.open_transport(use_tls)
    }

    /// Initiate the transport connection over the secure variant.
    pub fn connect_tls(&mut self) -> Result<(), ClientError> {
        self.open_transport(true)
    }

    fn open_transport(&mut self, use_tls: bool) -> Result<(), ClientError> {
        let path = self.socket_path();
        let host = self.config.host.clone();
        let port = self.config.port;
        debug!(%host, port, %path, use_tls, "opening transport");
        self.transport.open(&host, port, &path, use_tls)?;
        Ok(())
    }

    /// Advance heartbeat timing. Must be invoked at a regular cadence by the
    /// embedder; calling it more often than needed is harmless. Transport
    /// polling is the embedder's side of the contract.
    pub fn tick(&mut self) -> Result<(), ClientError> {
        let now = self.clock.now_millis();
        if self.heartbeat.due(now) {
            trace!("sending heartbeat");
            self.transport.send(b"\n")?;
            self.heartbeat.mark_sent(now);
            self.command_count += 1;
        }
        Ok(())
    }

    /// Feed one transport event into the engine.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> Result<(), ClientError> {
        match event {
            TransportEvent::Connected => self.open_session(),
            TransportEvent::Disconnected => {
                debug!("transport disconnected");
                self.state = ConnectionState::Disconnected;
                Ok(())
            }
            TransportEvent::TextReceived(payload) => self.on_text(&payload),
        }
    }

    fn on_text(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        if self.config.session_wrapper {
            match codec::demux_session_payload(payload) {
                Some(SessionPulse::Heartbeat) => {
                    self.server_pulses += 1;
                    Ok(())
                }
                Some(SessionPulse::Open) => self.open_session(),
                Some(SessionPulse::Data(data)) => {
                    let unwrapped = codec::strip_array_envelope(data);
                    self.on_frame_bytes(&unwrapped)
                }
                Some(SessionPulse::Other(marker)) => {
                    trace!(marker, "ignoring unknown session pulse");
                    Ok(())
                }
                None => Ok(()),
            }
        } else {
            self.on_frame_bytes(payload)
        }
    }

    fn on_frame_bytes(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        if codec::is_heartbeat(payload) {
            self.server_pulses += 1;
            return Ok(());
        }
        match codec::decode(payload) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => {
                debug!(%err, "dropping undecodable payload");
                Ok(())
            }
        }
    }

    /// Send the CONNECT frame and move to `Opening`. Duplicate open events
    /// (transport connect plus a wrapper open pulse) are a no-op once
    /// negotiation has begun.
    fn open_session(&mut self) -> Result<(), ClientError> {
        if self.state != ConnectionState::Disconnected {
            trace!(state = ?self.state, "ignoring duplicate open event");
            return Ok(());
        }
        self.state = ConnectionState::Opening;
        let mut frame = Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header(
                "heart-beat",
                format!("{},0", self.config.preferred_heartbeat_ms),
            );
        if let Some(login) = &self.config.login {
            frame = frame.header("login", login.clone());
        }
        self.send_frame(&frame)
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<(), ClientError> {
        trace!(command = %frame.command, "received frame");
        match frame.command {
            Command::Connected => self.handle_connected(&frame),
            Command::Message => self.handle_message(&frame),
            Command::Receipt => self.handle_receipt(&frame),
            Command::Error => self.handle_error(&frame),
            _ => {
                debug!(command = %frame.command, "discarding unsupported frame");
                Ok(())
            }
        }
    }

    fn handle_connected(&mut self, frame: &Frame) -> Result<(), ClientError> {
        // a repeated CONNECTED must not re-fire the callback
        if self.state == ConnectionState::Connected {
            return Ok(());
        }
        self.state = ConnectionState::Connected;
        self.heartbeat.negotiate(frame.header_value("heart-beat"));
        debug!("session established");
        if let Some(cb) = self.callbacks.connect.as_mut() {
            cb(frame);
        }
        Ok(())
    }

    /// Route a MESSAGE to its subscription and act on the handler's
    /// decision. Runs regardless of connection state: transport delivery
    /// order is not strictly guaranteed against our bookkeeping.
    fn handle_message(&mut self, frame: &Frame) -> Result<(), ClientError> {
        let token = frame.header_value("subscription");
        let Some(handle) = SubscriptionRegistry::parse_wire_id(token) else {
            debug!(token, "dropping MESSAGE with unrecognized subscription token");
            return Ok(());
        };
        match self.registry.dispatch(handle, frame) {
            Some(AckDecision::Ack) => self.ack(frame),
            Some(AckDecision::Nack) => self.nack(frame),
            Some(AckDecision::Continue) => Ok(()),
            None => {
                debug!(handle, "dropping MESSAGE for dead subscription");
                Ok(())
            }
        }
    }

    fn handle_receipt(&mut self, frame: &Frame) -> Result<(), ClientError> {
        if let Some(cb) = self.callbacks.receipt.as_mut() {
            cb(frame);
        }
        if self.state == ConnectionState::Disconnecting {
            self.state = ConnectionState::Disconnected;
            debug!("disconnect receipt received");
            if let Some(cb) = self.callbacks.disconnect.as_mut() {
                cb(frame);
            }
        }
        Ok(())
    }

    /// ERROR frames are fatal to the session. Recovery is the embedder's
    /// responsibility.
    fn handle_error(&mut self, frame: &Frame) -> Result<(), ClientError> {
        warn!(message = frame.header_value("message"), "broker error frame");
        self.state = ConnectionState::Disconnected;
        if let Some(cb) = self.callbacks.error.as_mut() {
            cb(frame);
        }
        if let Some(cb) = self.callbacks.disconnect.as_mut() {
            cb(frame);
        }
        Ok(())
    }

    /// Register interest in a destination. Returns the subscription handle,
    /// or [`ClientError::Full`] when every slot is taken (in which case no
    /// frame is sent).
    pub fn subscribe(
        &mut self,
        destination: &str,
        ack: AckMode,
        handler: impl FnMut(&Frame) -> AckDecision + 'static,
    ) -> Result<usize, ClientError> {
        let handle = self.registry.allocate(ack, Box::new(handler))?;
        let frame = Frame::new(Command::Subscribe)
            .header("id", SubscriptionRegistry::wire_id(handle))
            .header("destination", destination)
            .header("ack", ack.as_str());
        if let Err(err) = self.send_frame(&frame) {
            self.registry.release(handle);
            return Err(err);
        }
        debug!(handle, destination, "subscribed");
        Ok(handle)
    }

    /// Cancel a subscription. A dead or out-of-range handle is a silent
    /// no-op, locally and on the wire.
    pub fn unsubscribe(&mut self, handle: usize) -> Result<(), ClientError> {
        if !self.registry.release(handle) {
            trace!(handle, "unsubscribe for dead handle ignored");
            return Ok(());
        }
        debug!(handle, "unsubscribed");
        let frame =
            Frame::new(Command::Unsubscribe).header("id", SubscriptionRegistry::wire_id(handle));
        self.send_frame(&frame)
    }

    /// Acknowledge a delivered MESSAGE; the outgoing `id` header is taken
    /// from the message's `ack` header.
    pub fn ack(&mut self, message: &Frame) -> Result<(), ClientError> {
        let frame = Frame::new(Command::Ack).header("id", message.header_value("ack"));
        self.send_frame(&frame)
    }

    /// Reject a delivered MESSAGE; the outgoing `id` header is taken from
    /// the message's `ack` header.
    pub fn nack(&mut self, message: &Frame) -> Result<(), ClientError> {
        let frame = Frame::new(Command::Nack).header("id", message.header_value("ack"));
        self.send_frame(&frame)
    }

    /// Send a message body to a destination.
    pub fn send_message(&mut self, destination: &str, body: &str) -> Result<(), ClientError> {
        self.send_message_with_headers(destination, body, &[])
    }

    /// Send a message body to a destination with extra headers appended
    /// after `destination`.
    pub fn send_message_with_headers(
        &mut self,
        destination: &str,
        body: &str,
        extra_headers: &[(String, String)],
    ) -> Result<(), ClientError> {
        let mut frame = Frame::new(Command::Send).header("destination", destination);
        for (k, v) in extra_headers {
            frame = frame.header(k.clone(), v.clone());
        }
        let frame = frame.set_body(body);
        self.send_frame(&frame)
    }

    /// Request an orderly shutdown: sends DISCONNECT with a `receipt` header
    /// seeded from the command counter and moves to `Disconnecting`. The
    /// matching RECEIPT completes the lifecycle.
    pub fn disconnect(&mut self) -> Result<(), ClientError> {
        let frame =
            Frame::new(Command::Disconnect).header("receipt", self.command_count.to_string());
        self.state = ConnectionState::Disconnecting;
        self.send_frame(&frame)
    }

    fn send_frame(&mut self, frame: &Frame) -> Result<(), ClientError> {
        let mut buf = BytesMut::new();
        codec::encode(frame, &mut buf);
        trace!(command = %frame.command, bytes = buf.len(), "sending frame");
        self.transport.send(&buf)?;
        // any outgoing traffic satisfies liveness
        self.heartbeat.mark_sent(self.clock.now_millis());
        self.command_count += 1;
        Ok(())
    }
}

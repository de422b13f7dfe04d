//! Construction-time client configuration.

/// Configuration for a [`StompClient`](crate::StompClient), one instance per
/// transport connection.
#[derive(Debug, Clone)]
pub struct StompConfig {
    /// Host the transport should open.
    pub host: String,
    /// Port the transport should open.
    pub port: u16,
    /// Base request path for the connection bootstrap.
    pub path: String,
    /// Use the secure transport variant by default.
    pub use_tls: bool,
    /// Enable session-wrapper mode: random path segments on connect and
    /// one-byte marker demux on incoming payloads.
    pub session_wrapper: bool,
    /// Floor for the negotiated outgoing heartbeat interval.
    pub preferred_heartbeat_ms: u64,
    /// Maximum number of concurrent subscriptions.
    pub subscription_capacity: usize,
    /// Optional login identity sent in the CONNECT frame.
    pub login: Option<String>,
}

impl StompConfig {
    /// A configuration with the stock defaults: no TLS, no session wrapper,
    /// 10 second preferred heartbeat, 8 subscription slots, no login.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
            use_tls: false,
            session_wrapper: false,
            preferred_heartbeat_ms: 10_000,
            subscription_capacity: 8,
            login: None,
        }
    }

    /// Use the secure transport variant (builder style).
    pub fn tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// Enable or disable session-wrapper mode (builder style).
    pub fn session_wrapper(mut self, enabled: bool) -> Self {
        self.session_wrapper = enabled;
        self
    }

    /// Set the preferred outgoing heartbeat floor (builder style).
    pub fn preferred_heartbeat_ms(mut self, ms: u64) -> Self {
        self.preferred_heartbeat_ms = ms;
        self
    }

    /// Set the subscription slot count (builder style).
    pub fn subscription_capacity(mut self, capacity: usize) -> Self {
        self.subscription_capacity = capacity;
        self
    }

    /// Set the login identity for CONNECT (builder style).
    pub fn login(mut self, user: impl Into<String>) -> Self {
        self.login = Some(user.into());
        self
    }
}

use std::fmt;

/// The closed set of STOMP verbs this client understands.
///
/// Commands are decoded once at parse time and matched exhaustively
/// afterwards; a verb outside this set never makes it past the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    /// The wire spelling of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    /// Look up a verb as it appears on the wire. Returns `None` for anything
    /// outside the supported set.
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "CONNECT" => Some(Command::Connect),
            "CONNECTED" => Some(Command::Connected),
            "SEND" => Some(Command::Send),
            "SUBSCRIBE" => Some(Command::Subscribe),
            "UNSUBSCRIBE" => Some(Command::Unsubscribe),
            "ACK" => Some(Command::Ack),
            "NACK" => Some(Command::Nack),
            "MESSAGE" => Some(Command::Message),
            "RECEIPT" => Some(Command::Receipt),
            "ERROR" => Some(Command::Error),
            "DISCONNECT" => Some(Command::Disconnect),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame: command, ordered headers, text body.
///
/// Headers keep their wire order and duplicate keys are permitted; lookups
/// return the first match in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded STOMP verb.
    pub command: Command,
    /// Ordered headers as (key, value) pairs.
    pub headers: Vec<(String, String)>,
    /// Raw body text; empty for body-less frames.
    pub body: String,
}

impl Frame {
    /// Create a new frame with the given command and empty headers/body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Add a header (builder style).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the frame body (builder style).
    pub fn set_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the value of a header by name.
    ///
    /// Returns the first header value matching the given key (case-sensitive),
    /// or `None` if no such header exists.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the value of a header by name, with an empty string standing in
    /// for an absent key. Header absence is never an error in this protocol.
    pub fn header_value(&self, key: &str) -> &str {
        self.get_header(key).unwrap_or("")
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            writeln!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}

//! Heartbeat negotiation and outgoing-liveness scheduling.

use tracing::debug;

/// Parse a STOMP `heart-beat` header value (format: "sx,sy").
///
/// The values represent milliseconds. Missing or invalid fields default
/// to `0`.
pub fn parse_heartbeat_header(header: &str) -> (u64, u64) {
    let mut parts = header.split(',');
    let sx = parts
        .next()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let sy = parts
        .next()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    (sx, sy)
}

/// Scheduler for the outgoing half of the heartbeat contract.
///
/// Holds the client's preferred interval, the interval negotiated from the
/// server's CONNECTED frame, and the timestamp of the last outgoing payload.
/// All timestamps are caller-supplied milliseconds, so behavior is fully
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    preferred_ms: u64,
    interval_ms: u64,
    last_sent_ms: u64,
}

impl Heartbeat {
    /// A fresh scheduler with heartbeating disabled until negotiation.
    pub fn new(preferred_ms: u64, now_ms: u64) -> Self {
        Self {
            preferred_ms,
            interval_ms: 0,
            last_sent_ms: now_ms,
        }
    }

    /// Negotiate the effective send interval from a CONNECTED `heart-beat`
    /// header. An absent or empty header disables heartbeating entirely.
    ///
    /// The effective interval is `max(server value, preferred)`: the client
    /// never sends faster than its own preferred floor even when the server
    /// asks for less. This is a deliberate simplification of full
    /// bidirectional STOMP heartbeat negotiation.
    pub fn negotiate(&mut self, header: &str) {
        if header.trim().is_empty() {
            self.interval_ms = 0;
            return;
        }
        let (server_ms, _) = parse_heartbeat_header(header);
        self.interval_ms = server_ms.max(self.preferred_ms);
        debug!(interval_ms = self.interval_ms, "negotiated heartbeat interval");
    }

    /// The effective send interval in milliseconds; `0` means disabled.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Whether a heartbeat pulse is owed at `now_ms`. Safe to call
    /// arbitrarily often; false whenever the interval has not elapsed.
    pub fn due(&self, now_ms: u64) -> bool {
        self.interval_ms > 0 && now_ms.saturating_sub(self.last_sent_ms) > self.interval_ms
    }

    /// Record an outgoing payload. Any traffic satisfies liveness, so this
    /// is called for every send, heartbeat or frame.
    pub fn mark_sent(&mut self, now_ms: u64) {
        self.last_sent_ms = now_ms;
    }
}

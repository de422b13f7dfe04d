//! Shared test doubles: a recording transport, a manually advanced clock,
//! and a canned RNG.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use cobalt_stomp::transport::{Clock, PathRng, Transport, TransportError};
use cobalt_stomp::{StompClient, StompConfig};

/// Transport double that records everything the engine asks of it.
#[derive(Default)]
pub struct MockTransport {
    pub open_calls: Vec<(String, u16, String, bool)>,
    pub sent: Vec<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sent payloads decoded lossily to text for assertions.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl Transport for MockTransport {
    fn open(
        &mut self,
        host: &str,
        port: u16,
        path: &str,
        use_tls: bool,
    ) -> Result<(), TransportError> {
        self.open_calls
            .push((host.to_string(), port, path.to_string(), use_tls));
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.sent.push(payload.to_vec());
        Ok(())
    }
}

/// Clock whose current time is set by the test.
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.get()
    }
}

/// RNG returning a canned sequence, wrapping around when exhausted.
pub struct FixedRng {
    values: Vec<u32>,
    next: usize,
}

impl FixedRng {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, next: 0 }
    }
}

impl PathRng for FixedRng {
    fn next_below(&mut self, bound: u32) -> u32 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v % bound
    }
}

/// Client wired to the mock transport with a deterministic clock and RNG.
/// The clock starts at 1000 ms; the RNG yields 7 then 42, repeating.
pub fn test_client(config: StompConfig) -> (StompClient<MockTransport>, ManualClock) {
    let clock = ManualClock::new(1_000);
    let client = StompClient::with_parts(
        MockTransport::new(),
        config,
        Box::new(clock.clone()),
        Box::new(FixedRng::new(vec![7, 42])),
    );
    (client, clock)
}

/// Default config pointing at a local broker path.
pub fn test_config() -> StompConfig {
    StompConfig::new("127.0.0.1", 15674, "/stomp")
}

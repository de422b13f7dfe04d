//! Fixed-capacity subscription bookkeeping: handles, acknowledgement modes,
//! and message-consumer callbacks.

use thiserror::Error;

use crate::frame::Frame;

/// Subscription acknowledgement modes as defined by STOMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    Auto,
    Client,
    ClientIndividual,
}

impl AckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

/// What a message handler wants done with the frame it just consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    /// Send an ACK for this message.
    Ack,
    /// Send a NACK for this message.
    Nack,
    /// Take no acknowledgement action.
    Continue,
}

/// Callback invoked synchronously for each MESSAGE frame routed to a
/// subscription.
pub type MessageHandler = Box<dyn FnMut(&Frame) -> AckDecision>;

/// Returned by [`SubscriptionRegistry::allocate`] when every slot is taken.
/// No frame goes out in this case; the caller must handle it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("subscription capacity exhausted")]
pub struct RegistryFull;

struct Slot {
    ack: AckMode,
    handler: MessageHandler,
}

/// Fixed-capacity table of live subscriptions. The slot index doubles as the
/// stable handle carried in `id`/`subscription` headers.
pub struct SubscriptionRegistry {
    slots: Vec<Option<Slot>>,
}

impl SubscriptionRegistry {
    /// Create a registry with the given number of slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently live subscriptions.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Claim the lowest-numbered free slot. Freed handles are therefore
    /// reused deterministically, lowest index first.
    pub fn allocate(
        &mut self,
        ack: AckMode,
        handler: MessageHandler,
    ) -> Result<usize, RegistryFull> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(Slot { ack, handler });
                return Ok(index);
            }
        }
        Err(RegistryFull)
    }

    /// Mark a slot free. Idempotent: releasing an already-free or
    /// out-of-range handle is a no-op, since unsubscribe may race with
    /// disconnection. Returns whether the handle was live.
    pub fn release(&mut self, handle: usize) -> bool {
        match self.slots.get_mut(handle) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    pub fn is_live(&self, handle: usize) -> bool {
        matches!(self.slots.get(handle), Some(Some(_)))
    }

    /// Acknowledgement mode of a live subscription.
    pub fn ack_mode(&self, handle: usize) -> Option<AckMode> {
        self.slots.get(handle)?.as_ref().map(|slot| slot.ack)
    }

    /// Invoke the stored handler for a live handle and return its decision.
    /// A dead or out-of-range handle returns `None` and the frame is dropped.
    pub fn dispatch(&mut self, handle: usize, message: &Frame) -> Option<AckDecision> {
        let slot = self.slots.get_mut(handle)?.as_mut()?;
        Some((slot.handler)(message))
    }

    /// Wire token carried in `id`/`subscription` headers for a handle.
    pub fn wire_id(handle: usize) -> String {
        format!("sub-{handle}")
    }

    /// Parse a `subscription` header token back to its numeric handle.
    /// Malformed tokens yield `None`; range checking happens at dispatch.
    pub fn parse_wire_id(token: &str) -> Option<usize> {
        token.strip_prefix("sub-")?.parse().ok()
    }
}

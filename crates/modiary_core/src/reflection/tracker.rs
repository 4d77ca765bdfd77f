//! Request sequencing for reflection calls.
//!
//! Requests may resolve out of order. Each request carries a ticket with a
//! monotonically increasing sequence number; only the completion matching
//! the most recently issued ticket updates the visible message.

use log::debug;

/// Handle for one issued reflection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReflectionTicket(u64);

impl ReflectionTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Latest-wins holder for the displayed reflection message.
#[derive(Debug, Default)]
pub struct ReflectionTracker {
    latest: u64,
    pending: bool,
    message: Option<String>,
}

impl ReflectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request; every earlier ticket becomes stale.
    pub fn issue(&mut self) -> ReflectionTicket {
        self.latest += 1;
        self.pending = true;
        ReflectionTicket(self.latest)
    }

    /// Applies a response. Returns `false` and ignores it when stale.
    pub fn complete(&mut self, ticket: ReflectionTicket, message: impl Into<String>) -> bool {
        if ticket.0 != self.latest || !self.pending {
            debug!(
                "event=reflection_complete module=reflection status=stale sequence={} latest={}",
                ticket.0, self.latest
            );
            return false;
        }
        self.pending = false;
        self.message = Some(message.into());
        true
    }

    /// Invalidates any outstanding request without issuing a new one.
    pub fn cancel(&mut self) {
        if self.pending {
            self.latest += 1;
            self.pending = false;
        }
    }

    /// Clears the displayed message, e.g. when the selected date changes.
    pub fn clear(&mut self) {
        self.cancel();
        self.message = None;
    }

    /// Whether the most recent request is still outstanding.
    pub fn busy(&self) -> bool {
        self.pending
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

//! Identifier generation capability.
//!
//! Store-side code never calls `Uuid::new_v4` directly; it asks an
//! [`IdGenerator`] so tests and replays can inject deterministic ids.

use uuid::Uuid;

/// Source of globally unique entity identifiers.
pub trait IdGenerator {
    /// Returns a fresh id that has never been handed out by this generator.
    fn next_id(&mut self) -> Uuid;
}

/// Production generator backed by random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic generator yielding `Uuid::from_u128(n)`, `n = start, start + 1, ...`.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    next: u128,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Zero is bumped to one so the nil UUID is never produced.
    pub fn starting_at(first: u128) -> Self {
        Self {
            next: first.max(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next);
        self.next += 1;
        id
    }
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the snapshot persistence contract used by the state store.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Snapshots are written whole; there are no partial writes.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod state_repo;

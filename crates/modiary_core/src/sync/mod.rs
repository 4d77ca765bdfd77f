//! Snapshot reconciliation.
//!
//! # Responsibility
//! - Combine an imported backup with the current state without silent loss.
//!
//! # Invariants
//! - Merging never fails; every conflict has a deterministic resolution.

pub mod merge;

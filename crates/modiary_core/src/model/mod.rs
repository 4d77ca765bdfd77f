//! Domain model for routines, check statuses, schedules and diaries.
//!
//! # Responsibility
//! - Define the `AppState` aggregate, the sole unit of persistence and exchange.
//! - Apply forward-compatible defaults when older snapshots are decoded.
//! - Abstract identifier generation behind a capability trait.
//!
//! # Invariants
//! - Routine and schedule ids are stable, non-nil, and never reused.
//! - `(date, template_id)` pairs and diary dates are unique.

pub mod id;
pub mod state;

//! Import/export codecs.
//!
//! # Responsibility
//! - Decode third-party calendar exports into schedule candidates.
//! - Encode and decode whole-state backup documents.
//!
//! # Invariants
//! - Codecs are pure; persistence happens in the state store.

pub mod backup;
pub mod calendar;

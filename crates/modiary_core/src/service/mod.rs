//! Core use-case services.
//!
//! # Responsibility
//! - Define pure state transitions for every user mutation.
//! - Commit transitions through the single state store.
//! - Keep host layers decoupled from storage details.

pub mod state_store;
pub mod transition;

//! Diary reflection boundary.
//!
//! # Responsibility
//! - Define the request/response seam to the generative-text service.
//! - Degrade every failure to a fixed fallback message.
//! - Track request sequence numbers so only the latest response is shown.
//!
//! # Invariants
//! - Callers never receive a raw transport error.
//! - Diary text is never logged.

pub mod client;
pub mod tracker;

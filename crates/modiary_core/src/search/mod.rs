//! Text search entry points.
//!
//! # Responsibility
//! - Case-insensitive substring search across diaries and schedules.
//! - Keep result shaping (tagging, ordering) inside core.

pub mod text;

//! Read-only derivations over `AppState`.
//!
//! # Responsibility
//! - Daily completion ratio and the routine list shown for a date.
//! - Monthly per-routine statistics, summary and diary listing.
//!
//! # Invariants
//! - Functions never mutate state and are safe to re-run on every render.
//! - Percentages are integers in `0..=100`; empty candidate sets yield 0.

pub mod completion;
pub mod monthly;

/// Rounded `100 * part / whole`, half away from zero; 0 when `whole == 0`.
pub(crate) fn rounded_percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    // Integer form of round(100 * part / whole) for non-negative inputs.
    ((200 * part + whole) / (2 * whole)) as u32
}

/// Rounded arithmetic mean; 0 for an empty slice.
pub(crate) fn rounded_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&value| u64::from(value)).sum();
    let len = values.len() as u64;
    ((2 * sum + len) / (2 * len)) as u32
}

//! Per-day routine views.

use super::rounded_percent;
use crate::model::state::{weekday_index, AppState, RoutineTemplate};
use chrono::NaiveDate;

/// Share of today's active, scheduled routines that are completed, in percent.
///
/// Returns 0 when no active routine recurs on the weekday of `date`.
pub fn daily_completion_ratio(state: &AppState, date: NaiveDate) -> u32 {
    let weekday = weekday_index(date);
    let scheduled = state
        .routines
        .iter()
        .filter(|routine| routine.is_active && routine.recurs_on(weekday));

    let (total, completed) = scheduled.fold((0u32, 0u32), |(total, completed), routine| {
        let done = u32::from(state.is_completed(date, routine.id));
        (total + 1, completed + done)
    });

    rounded_percent(completed, total)
}

/// Routines to display for `date`, sorted by manual `order`.
///
/// Includes archived routines that were completed on that date so their
/// history stays visible.
pub fn routines_for_date(state: &AppState, date: NaiveDate) -> Vec<&RoutineTemplate> {
    let weekday = weekday_index(date);
    let mut routines: Vec<&RoutineTemplate> = state
        .routines
        .iter()
        .filter(|routine| routine.recurs_on(weekday))
        .filter(|routine| routine.is_active || state.is_completed(date, routine.id))
        .collect();
    routines.sort_by_key(|routine| routine.order);
    routines
}

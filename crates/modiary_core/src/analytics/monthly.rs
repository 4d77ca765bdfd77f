//! Monthly statistics over routines and diaries.
//!
//! A month is identified by any date inside it.

use super::{rounded_mean, rounded_percent};
use crate::model::state::{weekday_index, AppState, DiaryEntry, RoutineId};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Completion statistics for one active routine over one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineMonthStat {
    pub routine_id: RoutineId,
    pub text: String,
    /// Days in the month whose weekday is in the recurrence set.
    pub scheduled: u32,
    /// Scheduled days with a completed check.
    pub completed: u32,
    pub percent: u32,
}

/// Aggregate over all per-routine stats of a month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySummary {
    pub total_completed: u32,
    pub average_percent: u32,
    /// Highest percent; earliest in list order on ties.
    pub best_routine: Option<RoutineMonthStat>,
}

/// Returns every calendar day of the month containing `any_day`.
pub fn days_in_month(any_day: NaiveDate) -> Vec<NaiveDate> {
    let Some(first) = any_day.with_day(1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|day| day.month() == first.month())
        .collect()
}

/// Per-routine statistics for active routines, in routine list order.
pub fn monthly_routine_stats(state: &AppState, any_day: NaiveDate) -> Vec<RoutineMonthStat> {
    let days = days_in_month(any_day);
    let completed_keys: HashSet<(NaiveDate, RoutineId)> = state
        .check_statuses
        .iter()
        .filter(|status| status.completed)
        .map(|status| (status.date, status.template_id))
        .collect();

    state
        .routines
        .iter()
        .filter(|routine| routine.is_active)
        .map(|routine| {
            let mut scheduled = 0u32;
            let mut completed = 0u32;
            for day in days
                .iter()
                .filter(|day| routine.recurs_on(weekday_index(**day)))
            {
                scheduled += 1;
                if completed_keys.contains(&(*day, routine.id)) {
                    completed += 1;
                }
            }
            RoutineMonthStat {
                routine_id: routine.id,
                text: routine.text.clone(),
                scheduled,
                completed,
                percent: rounded_percent(completed, scheduled),
            }
        })
        .collect()
}

/// Summarizes per-routine statistics.
pub fn monthly_summary(stats: &[RoutineMonthStat]) -> MonthlySummary {
    let total_completed = stats.iter().map(|stat| stat.completed).sum();
    let percents: Vec<u32> = stats.iter().map(|stat| stat.percent).collect();
    let best_routine = stats
        .iter()
        .fold(None::<&RoutineMonthStat>, |best, stat| match best {
            Some(current) if current.percent >= stat.percent => Some(current),
            _ => Some(stat),
        })
        .cloned();

    MonthlySummary {
        total_completed,
        average_percent: rounded_mean(&percents),
        best_routine,
    }
}

/// Non-blank diary entries of the month containing `any_day`, newest first.
pub fn monthly_diaries(state: &AppState, any_day: NaiveDate) -> Vec<&DiaryEntry> {
    let mut entries: Vec<&DiaryEntry> = state
        .diaries
        .iter()
        .filter(|entry| {
            entry.date.year() == any_day.year() && entry.date.month() == any_day.month()
        })
        .filter(|entry| !entry.content.trim().is_empty())
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

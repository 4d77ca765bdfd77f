//! Merge engine for two independently evolved `AppState` snapshots.
//!
//! # Responsibility
//! - Reconcile routines, check statuses, schedules and diaries per entity key.
//! - Report what changed so callers can log a metadata-only summary.
//!
//! # Invariants
//! - `merge(s, s) == s`.
//! - A completion recorded by either side survives (`completed` is OR-ed).
//! - Diary text from both sides survives when it differs.
//! - Incoming routine and schedule definitions win id collisions.
//! - Output order: current entries keep their positions, new incoming keys
//!   follow in incoming order.

use crate::model::state::{
    AppState, CheckStatus, DiaryEntry, RoutineId, RoutineTemplate, Schedule, ScheduleId,
};
use chrono::NaiveDate;
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Visible separator placed between two diverging diary texts.
pub const DIARY_MERGE_SEPARATOR: &str = "\n---\n";

/// Per-entity counters describing one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub routines_added: usize,
    pub routines_replaced: usize,
    pub checks_added: usize,
    /// Collisions where the merged record became completed because of incoming.
    pub checks_completed: usize,
    pub schedules_added: usize,
    pub schedules_replaced: usize,
    pub diaries_added: usize,
    /// Collisions where both texts were kept.
    pub diaries_combined: usize,
}

/// Merges `incoming` into `current` and returns the reconciled state.
pub fn merge(current: &AppState, incoming: &AppState) -> AppState {
    merge_with_summary(current, incoming).0
}

/// Same as [`merge`], also returning per-entity change counters.
pub fn merge_with_summary(current: &AppState, incoming: &AppState) -> (AppState, MergeSummary) {
    let mut summary = MergeSummary::default();

    let routines = merge_routines(&current.routines, &incoming.routines, &mut summary);
    let check_statuses =
        merge_check_statuses(&current.check_statuses, &incoming.check_statuses, &mut summary);
    let schedules = merge_schedules(&current.schedules, &incoming.schedules, &mut summary);
    let diaries = merge_diaries(&current.diaries, &incoming.diaries, &mut summary);

    let state = AppState {
        routines,
        check_statuses,
        schedules,
        diaries,
    };
    (state, summary)
}

fn merge_routines(
    current: &[RoutineTemplate],
    incoming: &[RoutineTemplate],
    summary: &mut MergeSummary,
) -> Vec<RoutineTemplate> {
    let mut merged: IndexMap<RoutineId, RoutineTemplate> = current
        .iter()
        .map(|routine| (routine.id, routine.clone()))
        .collect();

    for routine in incoming {
        match merged.insert(routine.id, routine.clone()) {
            Some(previous) if previous != *routine => summary.routines_replaced += 1,
            Some(_) => {}
            None => summary.routines_added += 1,
        }
    }

    merged.into_values().collect()
}

fn merge_check_statuses(
    current: &[CheckStatus],
    incoming: &[CheckStatus],
    summary: &mut MergeSummary,
) -> Vec<CheckStatus> {
    let mut merged: IndexMap<(NaiveDate, RoutineId), CheckStatus> = current
        .iter()
        .map(|status| ((status.date, status.template_id), status.clone()))
        .collect();

    for status in incoming {
        match merged.entry((status.date, status.template_id)) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if status.completed && !existing.completed {
                    summary.checks_completed += 1;
                }
                existing.completed = existing.completed || status.completed;
            }
            Entry::Vacant(slot) => {
                slot.insert(status.clone());
                summary.checks_added += 1;
            }
        }
    }

    merged.into_values().collect()
}

fn merge_schedules(
    current: &[Schedule],
    incoming: &[Schedule],
    summary: &mut MergeSummary,
) -> Vec<Schedule> {
    let mut merged: IndexMap<ScheduleId, Schedule> = current
        .iter()
        .map(|schedule| (schedule.id, schedule.clone()))
        .collect();

    for schedule in incoming {
        match merged.insert(schedule.id, schedule.clone()) {
            Some(previous) if previous != *schedule => summary.schedules_replaced += 1,
            Some(_) => {}
            None => summary.schedules_added += 1,
        }
    }

    merged.into_values().collect()
}

fn merge_diaries(
    current: &[DiaryEntry],
    incoming: &[DiaryEntry],
    summary: &mut MergeSummary,
) -> Vec<DiaryEntry> {
    let mut merged: IndexMap<NaiveDate, DiaryEntry> = current
        .iter()
        .map(|entry| (entry.date, entry.clone()))
        .collect();

    for entry in incoming {
        match merged.entry(entry.date) {
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let content = merge_diary_content(&existing.content, &entry.content);
                if content != existing.content && content != entry.content {
                    summary.diaries_combined += 1;
                }
                existing.content = content;
                if entry.mood.is_some() {
                    existing.mood = entry.mood.clone();
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                summary.diaries_added += 1;
            }
        }
    }

    merged.into_values().collect()
}

/// Combines two diary texts for the same date.
///
/// - A blank side yields the other side.
/// - Identical texts, or a text already present as a separated segment of the
///   other, yield the larger one unchanged.
/// - Otherwise `current`, the separator, then `incoming`.
pub fn merge_diary_content(current: &str, incoming: &str) -> String {
    if current == incoming {
        return current.to_string();
    }
    if current.trim().is_empty() {
        return incoming.to_string();
    }
    if incoming.trim().is_empty() || contains_segment(current, incoming) {
        return current.to_string();
    }
    if contains_segment(incoming, current) {
        return incoming.to_string();
    }
    format!("{current}{DIARY_MERGE_SEPARATOR}{incoming}")
}

fn contains_segment(haystack: &str, segment: &str) -> bool {
    haystack
        .split(DIARY_MERGE_SEPARATOR)
        .any(|part| part == segment)
}

#[cfg(test)]
mod tests {
    use super::{merge_diary_content, DIARY_MERGE_SEPARATOR};

    #[test]
    fn blank_sides_fall_through_to_the_other() {
        assert_eq!(merge_diary_content("", "B"), "B");
        assert_eq!(merge_diary_content("A", "   "), "A");
        assert_eq!(merge_diary_content("", ""), "");
    }

    #[test]
    fn diverging_texts_are_joined_current_first() {
        assert_eq!(
            merge_diary_content("A", "B"),
            format!("A{DIARY_MERGE_SEPARATOR}B")
        );
    }

    #[test]
    fn already_merged_segment_is_not_appended_twice() {
        let once = merge_diary_content("A", "B");
        assert_eq!(merge_diary_content(&once, "B"), once);
        assert_eq!(merge_diary_content("A", &once), once);
    }
}

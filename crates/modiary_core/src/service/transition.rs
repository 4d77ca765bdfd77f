//! Pure state transitions.
//!
//! Every user mutation is a function from the current `AppState` (by value)
//! to the next one. Nothing here touches storage; the state store decides
//! when a transition is committed.
//!
//! # Invariants
//! - Deleting a routine removes exactly its check statuses.
//! - At most one check status per `(date, template_id)` and one diary per date.
//! - New routines take `max(order) + 1`.

use crate::import::calendar::{
    merge_candidates, parse_calendar, CalendarImportError, CalendarMerge,
};
use crate::model::id::IdGenerator;
use crate::model::state::{
    AppState, CheckStatus, DiaryEntry, RecurrenceKind, RoutineId, RoutineTemplate, Schedule,
    ScheduleId, MAX_WEEKDAY_INDEX, SCHEDULE_COLORS,
};
use crate::sync::merge::{merge_with_summary, MergeSummary};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SCHEDULE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid schedule time regex")
});

pub type TransitionResult<T> = Result<T, TransitionError>;

/// Rejected user mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    EmptyText { field: &'static str },
    InvalidWeekday(u8),
    /// Schedule time must be `HH:MM` or empty.
    InvalidTime(String),
    /// Schedule color must be one of [`SCHEDULE_COLORS`].
    InvalidColor(String),
    RoutineNotFound(RoutineId),
    ScheduleNotFound(ScheduleId),
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText { field } => write!(f, "{field} must not be empty"),
            Self::InvalidWeekday(day) => {
                write!(f, "weekday index {day} is out of range 0..={MAX_WEEKDAY_INDEX}")
            }
            Self::InvalidTime(value) => {
                write!(f, "schedule time `{value}` must be HH:MM or empty")
            }
            Self::InvalidColor(value) => {
                write!(f, "schedule color `{value}` is not in the palette")
            }
            Self::RoutineNotFound(id) => write!(f, "routine not found: {id}"),
            Self::ScheduleNotFound(id) => write!(f, "schedule not found: {id}"),
        }
    }
}

impl Error for TransitionError {}

/// Direction for manual routine reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Input for a user-created schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub date: NaiveDate,
    pub time: String,
    pub text: String,
    pub color: Option<String>,
}

/// Appends a weekly routine with trimmed text; returns its new id.
pub fn add_routine(
    mut state: AppState,
    text: &str,
    days: impl IntoIterator<Item = u8>,
    ids: &mut dyn IdGenerator,
) -> TransitionResult<(AppState, RoutineId)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TransitionError::EmptyText {
            field: "routine text",
        });
    }
    let recurrence_days = days.into_iter().collect::<BTreeSet<u8>>();
    if let Some(&day) = recurrence_days.iter().find(|&&day| day > MAX_WEEKDAY_INDEX) {
        return Err(TransitionError::InvalidWeekday(day));
    }

    let order = state
        .routines
        .iter()
        .map(|routine| routine.order)
        .max()
        .map_or(0, |max| max + 1);
    let id = ids.next_id();
    state.routines.push(RoutineTemplate {
        id,
        text: text.to_string(),
        kind: RecurrenceKind::Weekly,
        recurrence_days,
        is_active: true,
        order,
    });
    Ok((state, id))
}

/// Removes a routine and every check status recorded for it.
pub fn delete_routine(mut state: AppState, id: RoutineId) -> TransitionResult<AppState> {
    let before = state.routines.len();
    state.routines.retain(|routine| routine.id != id);
    if state.routines.len() == before {
        return Err(TransitionError::RoutineNotFound(id));
    }
    state.check_statuses.retain(|status| status.template_id != id);
    Ok(state)
}

/// Archives (`false`) or restores (`true`) a routine.
pub fn set_routine_active(
    mut state: AppState,
    id: RoutineId,
    active: bool,
) -> TransitionResult<AppState> {
    let routine = state
        .routines
        .iter_mut()
        .find(|routine| routine.id == id)
        .ok_or(TransitionError::RoutineNotFound(id))?;
    routine.is_active = active;
    Ok(state)
}

/// Swaps `order` with the neighbour in sorted order; no-op at either edge.
pub fn move_routine(
    mut state: AppState,
    id: RoutineId,
    direction: MoveDirection,
) -> TransitionResult<AppState> {
    let mut sorted: Vec<usize> = (0..state.routines.len()).collect();
    sorted.sort_by_key(|&index| state.routines[index].order);

    let position = sorted
        .iter()
        .position(|&index| state.routines[index].id == id)
        .ok_or(TransitionError::RoutineNotFound(id))?;
    let neighbour = match direction {
        MoveDirection::Up => position.checked_sub(1),
        MoveDirection::Down => Some(position + 1).filter(|&next| next < sorted.len()),
    };
    let Some(neighbour) = neighbour else {
        return Ok(state);
    };

    let (a, b) = (sorted[position], sorted[neighbour]);
    let order_a = state.routines[a].order;
    let order_b = state.routines[b].order;
    if order_a == order_b {
        // Colliding orders from old snapshots: make the move observable.
        state.routines[a].order = match direction {
            MoveDirection::Up => order_b - 1,
            MoveDirection::Down => order_b + 1,
        };
    } else {
        state.routines[a].order = order_b;
        state.routines[b].order = order_a;
    }
    Ok(state)
}

/// Flips the check for `(date, template_id)`, creating it as completed.
pub fn toggle_check(
    mut state: AppState,
    date: NaiveDate,
    template_id: RoutineId,
) -> TransitionResult<AppState> {
    if state.routine(template_id).is_none() {
        return Err(TransitionError::RoutineNotFound(template_id));
    }
    match state
        .check_statuses
        .iter_mut()
        .find(|status| status.date == date && status.template_id == template_id)
    {
        Some(status) => status.completed = !status.completed,
        None => state.check_statuses.push(CheckStatus {
            date,
            template_id,
            completed: true,
        }),
    }
    Ok(state)
}

/// Appends a user-created schedule; returns its new id.
pub fn add_schedule(
    mut state: AppState,
    request: NewSchedule,
    ids: &mut dyn IdGenerator,
) -> TransitionResult<(AppState, ScheduleId)> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(TransitionError::EmptyText {
            field: "schedule text",
        });
    }
    let time = request.time.trim();
    if !time.is_empty() && !SCHEDULE_TIME_RE.is_match(time) {
        return Err(TransitionError::InvalidTime(time.to_string()));
    }
    if let Some(color) = request
        .color
        .as_deref()
        .filter(|color| !SCHEDULE_COLORS.contains(color))
    {
        return Err(TransitionError::InvalidColor(color.to_string()));
    }

    let id = ids.next_id();
    state.schedules.push(Schedule {
        id,
        date: request.date,
        time: time.to_string(),
        text: text.to_string(),
        color: request.color,
    });
    Ok((state, id))
}

pub fn remove_schedule(mut state: AppState, id: ScheduleId) -> TransitionResult<AppState> {
    let before = state.schedules.len();
    state.schedules.retain(|schedule| schedule.id != id);
    if state.schedules.len() == before {
        return Err(TransitionError::ScheduleNotFound(id));
    }
    Ok(state)
}

/// Upserts the diary content for `date`.
pub fn update_diary(mut state: AppState, date: NaiveDate, content: &str) -> AppState {
    match state.diaries.iter_mut().find(|entry| entry.date == date) {
        Some(entry) => entry.content = content.to_string(),
        None => state.diaries.push(DiaryEntry {
            date,
            content: content.to_string(),
            mood: None,
        }),
    }
    state
}

/// Reconciles an imported backup with the current state.
pub fn apply_merge(state: AppState, incoming: &AppState) -> (AppState, MergeSummary) {
    merge_with_summary(&state, incoming)
}

/// Discards the current state in favour of an imported backup.
pub fn apply_replace(_state: AppState, incoming: AppState) -> AppState {
    incoming
}

/// Parses calendar text and appends non-duplicate events as schedules.
///
/// # Errors
/// - `NoEvents` when the text has no importable event; state is dropped
///   unchanged by the caller.
pub fn apply_calendar_import(
    state: AppState,
    calendar_text: &str,
    ids: &mut dyn IdGenerator,
) -> Result<CalendarMerge, CalendarImportError> {
    let candidates = parse_calendar(calendar_text);
    if candidates.is_empty() {
        return Err(CalendarImportError::NoEvents);
    }
    Ok(merge_candidates(state, &candidates, ids))
}

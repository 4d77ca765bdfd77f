//! `AppState` aggregate and entity records.
//!
//! # Responsibility
//! - Define the canonical wire/persistence shape (camelCase JSON).
//! - Default missing fields when decoding snapshots written by older builds.
//! - Reject decoded documents that break uniqueness invariants.
//!
//! # Invariants
//! - Weekday indices are `0..=6`, Sunday first.
//! - A routine decoded without `isActive` is active; without `order` it takes
//!   its positional index.
//! - Decoding never yields duplicate routine ids, schedule ids,
//!   `(date, templateId)` pairs or diary dates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a routine template.
pub type RoutineId = Uuid;
/// Stable identifier of a one-off schedule.
pub type ScheduleId = Uuid;

/// Highest valid weekday index (Saturday).
pub const MAX_WEEKDAY_INDEX: u8 = 6;

/// Palette of schedule colors understood by the front end.
pub const SCHEDULE_COLORS: &[&str] = &[
    "bg-indigo-500",
    "bg-rose-500",
    "bg-amber-500",
    "bg-emerald-500",
    "bg-sky-500",
    "bg-slate-500",
];

/// Color assigned to schedules that do not carry one (including imports).
pub const DEFAULT_SCHEDULE_COLOR: &str = "bg-indigo-500";

/// Returns the weekday index of `date`, `0 = Sunday .. 6 = Saturday`.
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_sunday() is always within 0..=6.
    date.weekday().num_days_from_sunday() as u8
}

/// Recurrence flavour recorded with a routine.
///
/// Informational only: scheduling is decided by `recurrence_days`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    Daily,
    #[default]
    Weekly,
    Once,
}

/// Recurring task definition, not a per-day occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineTemplate {
    pub id: RoutineId,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: RecurrenceKind,
    /// Serialized as `days` to stay compatible with existing backups.
    #[serde(rename = "days")]
    pub recurrence_days: BTreeSet<u8>,
    /// `false` archives the routine without destroying its history.
    pub is_active: bool,
    /// Manual sort key.
    pub order: i64,
}

impl RoutineTemplate {
    /// Returns whether this routine is scheduled on the given weekday index.
    pub fn recurs_on(&self, weekday: u8) -> bool {
        self.recurrence_days.contains(&weekday)
    }
}

/// Completion state of one routine on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatus {
    pub date: NaiveDate,
    pub template_id: RoutineId,
    pub completed: bool,
}

/// One-off calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub date: NaiveDate,
    /// `HH:MM`, or empty for an all-day event.
    #[serde(default)]
    pub time: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Schedule {
    pub fn is_all_day(&self) -> bool {
        self.time.is_empty()
    }

    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_SCHEDULE_COLOR)
    }
}

/// Diary text for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub date: NaiveDate,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

/// Complete persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "AppStateDocument")]
pub struct AppState {
    pub routines: Vec<RoutineTemplate>,
    pub check_statuses: Vec<CheckStatus>,
    pub schedules: Vec<Schedule>,
    pub diaries: Vec<DiaryEntry>,
}

impl AppState {
    pub fn routine(&self, id: RoutineId) -> Option<&RoutineTemplate> {
        self.routines.iter().find(|routine| routine.id == id)
    }

    pub fn schedule(&self, id: ScheduleId) -> Option<&Schedule> {
        self.schedules.iter().find(|schedule| schedule.id == id)
    }

    pub fn diary(&self, date: NaiveDate) -> Option<&DiaryEntry> {
        self.diaries.iter().find(|entry| entry.date == date)
    }

    pub fn check_status(&self, date: NaiveDate, template_id: RoutineId) -> Option<&CheckStatus> {
        self.check_statuses
            .iter()
            .find(|status| status.date == date && status.template_id == template_id)
    }

    /// Returns whether `template_id` has a completed check on `date`.
    pub fn is_completed(&self, date: NaiveDate, template_id: RoutineId) -> bool {
        self.check_status(date, template_id)
            .is_some_and(|status| status.completed)
    }

    /// Checks aggregate invariants.
    ///
    /// # Errors
    /// - Returns the first violated invariant in field order.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        let mut routine_ids = HashSet::new();
        for routine in &self.routines {
            if routine.id.is_nil() {
                return Err(StateValidationError::NilId { entity: "routine" });
            }
            if !routine_ids.insert(routine.id) {
                return Err(StateValidationError::DuplicateRoutineId(routine.id));
            }
            if let Some(&weekday) = routine
                .recurrence_days
                .iter()
                .find(|&&day| day > MAX_WEEKDAY_INDEX)
            {
                return Err(StateValidationError::WeekdayOutOfRange {
                    routine_id: routine.id,
                    weekday,
                });
            }
        }

        let mut check_keys = HashSet::new();
        for status in &self.check_statuses {
            if !check_keys.insert((status.date, status.template_id)) {
                return Err(StateValidationError::DuplicateCheckStatus {
                    date: status.date,
                    template_id: status.template_id,
                });
            }
        }

        let mut schedule_ids = HashSet::new();
        for schedule in &self.schedules {
            if schedule.id.is_nil() {
                return Err(StateValidationError::NilId { entity: "schedule" });
            }
            if !schedule_ids.insert(schedule.id) {
                return Err(StateValidationError::DuplicateScheduleId(schedule.id));
            }
        }

        let mut diary_dates = HashSet::new();
        for entry in &self.diaries {
            if !diary_dates.insert(entry.date) {
                return Err(StateValidationError::DuplicateDiaryDate(entry.date));
            }
        }

        Ok(())
    }
}

/// Invariant violations detected in a decoded or constructed `AppState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    NilId {
        entity: &'static str,
    },
    DuplicateRoutineId(RoutineId),
    DuplicateScheduleId(ScheduleId),
    DuplicateCheckStatus {
        date: NaiveDate,
        template_id: RoutineId,
    },
    DuplicateDiaryDate(NaiveDate),
    WeekdayOutOfRange {
        routine_id: RoutineId,
        weekday: u8,
    },
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId { entity } => write!(f, "{entity} id must not be nil"),
            Self::DuplicateRoutineId(id) => write!(f, "duplicate routine id: {id}"),
            Self::DuplicateScheduleId(id) => write!(f, "duplicate schedule id: {id}"),
            Self::DuplicateCheckStatus { date, template_id } => {
                write!(f, "duplicate check status for {template_id} on {date}")
            }
            Self::DuplicateDiaryDate(date) => write!(f, "duplicate diary entry for {date}"),
            Self::WeekdayOutOfRange {
                routine_id,
                weekday,
            } => write!(
                f,
                "routine {routine_id} has weekday index {weekday}; expected 0..={MAX_WEEKDAY_INDEX}"
            ),
        }
    }
}

impl Error for StateValidationError {}

/// Lenient decode shape for snapshots written by any build.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppStateDocument {
    #[serde(default)]
    routines: Vec<StoredRoutine>,
    #[serde(default)]
    check_statuses: Vec<CheckStatus>,
    #[serde(default)]
    schedules: Vec<Schedule>,
    #[serde(default)]
    diaries: Vec<DiaryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRoutine {
    id: RoutineId,
    text: String,
    #[serde(rename = "type", default)]
    kind: RecurrenceKind,
    #[serde(rename = "days", alias = "recurrenceDays", default)]
    recurrence_days: BTreeSet<u8>,
    is_active: Option<bool>,
    order: Option<i64>,
}

impl TryFrom<AppStateDocument> for AppState {
    type Error = StateValidationError;

    fn try_from(document: AppStateDocument) -> Result<Self, Self::Error> {
        let routines = document
            .routines
            .into_iter()
            .enumerate()
            .map(|(index, stored)| RoutineTemplate {
                id: stored.id,
                text: stored.text,
                kind: stored.kind,
                recurrence_days: stored.recurrence_days,
                is_active: stored.is_active.unwrap_or(true),
                order: stored.order.unwrap_or(index as i64),
            })
            .collect();

        let state = AppState {
            routines,
            check_statuses: document.check_statuses,
            schedules: document.schedules,
            diaries: document.diaries,
        };
        state.validate()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::{weekday_index, AppState, StateValidationError};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_index_starts_on_sunday() {
        assert_eq!(weekday_index(date(2024, 3, 17)), 0);
        assert_eq!(weekday_index(date(2024, 3, 18)), 1);
        assert_eq!(weekday_index(date(2024, 3, 23)), 6);
    }

    #[test]
    fn decode_rejects_out_of_range_weekday() {
        let value = serde_json::json!({
            "routines": [{
                "id": "00000000-0000-0000-0000-000000000001",
                "text": "stretch",
                "days": [1, 7]
            }]
        });
        let err = serde_json::from_value::<AppState>(value).unwrap_err();
        assert!(err.to_string().contains("weekday index 7"), "{err}");
    }

    #[test]
    fn validate_reports_duplicate_diary_dates() {
        let value = serde_json::json!({
            "diaries": [
                {"date": "2024-01-01", "content": "a"},
                {"date": "2024-01-01", "content": "b"}
            ]
        });
        let err = serde_json::from_value::<AppState>(value).unwrap_err();
        assert!(err
            .to_string()
            .contains(&StateValidationError::DuplicateDiaryDate(date(2024, 1, 1)).to_string()));
    }
}

//! iCalendar subset parser and schedule deduplication.
//!
//! # Responsibility
//! - Scan `BEGIN:VEVENT`/`END:VEVENT` blocks and read `SUMMARY:` and
//!   `DTSTART...:` lines; every other property is ignored.
//! - Append surviving candidates to the schedule list with fresh ids.
//!
//! # Invariants
//! - Parsing never fails; malformed lines and incomplete events are dropped.
//! - Events without a valid date or without summary text are never emitted.
//! - A candidate whose `(date, text)` already exists is not added twice.

use crate::model::id::IdGenerator;
use crate::model::state::{AppState, Schedule, DEFAULT_SCHEDULE_COLOR};
use chrono::NaiveDate;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const EVENT_BEGIN: &str = "BEGIN:VEVENT";
const EVENT_END: &str = "END:VEVENT";
const SUMMARY_PREFIX: &str = "SUMMARY:";
const START_PREFIX: &str = "DTSTART";
const MIN_TIMED_VALUE_LEN: usize = 13;

static DATE_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{8}$").expect("valid calendar date regex"));
static CLOCK_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}$").expect("valid calendar clock regex"));

/// Schedule candidate extracted from one calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCandidate {
    pub date: NaiveDate,
    /// `HH:MM`, or empty for all-day events.
    pub time: String,
    pub text: String,
}

/// Result of appending candidates to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMerge {
    pub state: AppState,
    pub added: usize,
    pub duplicates: usize,
}

/// Calendar import failures surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarImportError {
    /// The text contained no event with both a date and a summary.
    NoEvents,
}

impl Display for CalendarImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEvents => write!(f, "calendar file contains no importable events"),
        }
    }
}

impl Error for CalendarImportError {}

#[derive(Debug, Default)]
struct PendingEvent {
    date: Option<NaiveDate>,
    time: String,
    text: Option<String>,
}

impl PendingEvent {
    fn into_candidate(self) -> Option<CalendarCandidate> {
        let date = self.date?;
        let text = self.text.filter(|text| !text.is_empty())?;
        Some(CalendarCandidate {
            date,
            time: self.time,
            text,
        })
    }
}

enum ScanState {
    OutsideEvent,
    InsideEvent(PendingEvent),
}

/// Parses calendar text into schedule candidates in file order.
pub fn parse_calendar(text: &str) -> Vec<CalendarCandidate> {
    let mut candidates = Vec::new();
    let mut state = ScanState::OutsideEvent;
    let mut dropped = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.starts_with(EVENT_BEGIN) {
            state = ScanState::InsideEvent(PendingEvent::default());
            continue;
        }

        if line.starts_with(EVENT_END) {
            if let ScanState::InsideEvent(event) =
                std::mem::replace(&mut state, ScanState::OutsideEvent)
            {
                match event.into_candidate() {
                    Some(candidate) => candidates.push(candidate),
                    None => dropped += 1,
                }
            }
            continue;
        }

        let ScanState::InsideEvent(event) = &mut state else {
            continue;
        };

        if let Some(summary) = line.strip_prefix(SUMMARY_PREFIX) {
            event.text = Some(summary.trim().to_string());
        } else if line.starts_with(START_PREFIX) {
            apply_start_line(event, line, line_no);
        }
    }

    debug!(
        "event=calendar_parse module=import status=ok candidates={} dropped={}",
        candidates.len(),
        dropped
    );
    candidates
}

fn apply_start_line(event: &mut PendingEvent, line: &str, line_no: usize) {
    let Some(value) = line.split(':').nth(1).filter(|value| !value.is_empty()) else {
        return;
    };

    let Some(date) = decode_start_date(value) else {
        warn!(
            "event=calendar_parse module=import status=skipped line={line_no} error_code=invalid_start_date"
        );
        return;
    };

    event.date = Some(date);
    event.time = decode_start_time(value).unwrap_or_default();
}

fn decode_start_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..8).filter(|part| DATE_PART_RE.is_match(part))?;
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

fn decode_start_time(value: &str) -> Option<String> {
    if !value.contains('T') || value.len() < MIN_TIMED_VALUE_LEN {
        return None;
    }
    let hour = value.get(9..11).filter(|part| CLOCK_PART_RE.is_match(part))?;
    let minute = value.get(11..13).filter(|part| CLOCK_PART_RE.is_match(part))?;
    Some(format!("{hour}:{minute}"))
}

/// Appends candidates as new schedules, skipping exact `(date, text)` repeats.
///
/// Duplicates are detected against existing schedules and against candidates
/// accepted earlier in the same call.
pub fn merge_candidates(
    mut state: AppState,
    candidates: &[CalendarCandidate],
    ids: &mut dyn IdGenerator,
) -> CalendarMerge {
    let mut seen: HashSet<(NaiveDate, String)> = state
        .schedules
        .iter()
        .map(|schedule| (schedule.date, schedule.text.clone()))
        .collect();
    let mut added = 0usize;
    let mut duplicates = 0usize;

    for candidate in candidates {
        if !seen.insert((candidate.date, candidate.text.clone())) {
            duplicates += 1;
            continue;
        }
        state.schedules.push(Schedule {
            id: ids.next_id(),
            date: candidate.date,
            time: candidate.time.clone(),
            text: candidate.text.clone(),
            color: Some(DEFAULT_SCHEDULE_COLOR.to_string()),
        });
        added += 1;
    }

    CalendarMerge {
        state,
        added,
        duplicates,
    }
}

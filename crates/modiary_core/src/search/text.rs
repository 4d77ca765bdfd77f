//! Substring search over diary content and schedule text.
//!
//! # Invariants
//! - Blank queries return no hits.
//! - Hits are sorted by date descending; within one date diaries precede
//!   schedules and each keeps its stored order.

use crate::model::state::AppState;
use chrono::NaiveDate;

/// Origin of a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Diary,
    Schedule,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diary => "diary",
            Self::Schedule => "schedule",
        }
    }
}

/// Search options.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    /// Restrict hits to one origin.
    pub kind: Option<SearchKind>,
    /// Maximum number of hits; `None` returns all.
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Creates an unfiltered, unlimited query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            limit: None,
        }
    }
}

/// Single tagged search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub date: NaiveDate,
    pub text: String,
}

/// Searches diaries and schedules for `query.text`.
pub fn search(state: &AppState, query: &SearchQuery) -> Vec<SearchHit> {
    if query.text.trim().is_empty() || query.limit == Some(0) {
        return Vec::new();
    }
    // Surrounding spaces are part of the needle.
    let needle = query.text.to_lowercase();

    let wants = |kind: SearchKind| query.kind.map_or(true, |only| only == kind);
    let mut hits = Vec::new();

    if wants(SearchKind::Diary) {
        hits.extend(
            state
                .diaries
                .iter()
                .filter(|entry| entry.content.to_lowercase().contains(&needle))
                .map(|entry| SearchHit {
                    kind: SearchKind::Diary,
                    date: entry.date,
                    text: entry.content.clone(),
                }),
        );
    }

    if wants(SearchKind::Schedule) {
        hits.extend(
            state
                .schedules
                .iter()
                .filter(|schedule| schedule.text.to_lowercase().contains(&needle))
                .map(|schedule| SearchHit {
                    kind: SearchKind::Schedule,
                    date: schedule.date,
                    text: schedule.text.clone(),
                }),
        );
    }

    hits.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = query.limit {
        hits.truncate(limit);
    }
    hits
}

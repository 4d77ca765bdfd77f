//! Canonical state holder.
//!
//! # Responsibility
//! - Load the persisted snapshot once at startup.
//! - Commit transitions: compute the next state, persist it whole, then swap.
//! - Expose backup and calendar import/export as use-case operations.
//!
//! # Invariants
//! - The in-memory state only changes after a successful write.
//! - A failed transition or write leaves the previous state untouched.
//! - Only states that pass `AppState::validate` are written.
//! - Logs carry counts and operation names, never user text.

use crate::import::backup::{
    backup_file_name, decode_backup, encode_backup, BackupError, ImportMode,
};
use crate::import::calendar::CalendarImportError;
use crate::model::id::{IdGenerator, RandomIdGenerator};
use crate::model::state::{AppState, RoutineId, ScheduleId, StateValidationError};
use crate::repo::state_repo::{RepoError, StateRepository};
use crate::service::transition::{self, MoveDirection, NewSchedule, TransitionError};
use crate::sync::merge::MergeSummary;
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Transition(TransitionError),
    Backup(BackupError),
    Calendar(CalendarImportError),
    /// The next state breaks an aggregate invariant and was not written.
    Invalid(StateValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Transition(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "{err}"),
            Self::Calendar(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "refusing to save invalid state: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Transition(err) => Some(err),
            Self::Backup(err) => Some(err),
            Self::Calendar(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TransitionError> for StoreError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

impl From<BackupError> for StoreError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<StateValidationError> for StoreError {
    fn from(value: StateValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<CalendarImportError> for StoreError {
    fn from(value: CalendarImportError) -> Self {
        Self::Calendar(value)
    }
}

/// Outcome of a backup import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupImport {
    Merged(MergeSummary),
    Replaced,
}

/// Export payload ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupExport {
    pub file_name: String,
    pub document: String,
}

/// Outcome of a calendar import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarImport {
    pub added: usize,
    pub duplicates: usize,
}

/// Single owner of the canonical `AppState`.
pub struct StateStore<R: StateRepository, G: IdGenerator = RandomIdGenerator> {
    repo: R,
    ids: G,
    state: AppState,
}

impl<R: StateRepository> StateStore<R, RandomIdGenerator> {
    /// Opens the store with random id generation.
    pub fn open(repo: R) -> StoreResult<Self> {
        Self::open_with_ids(repo, RandomIdGenerator)
    }
}

impl<R: StateRepository, G: IdGenerator> StateStore<R, G> {
    /// Loads the persisted snapshot, or starts empty when none exists.
    ///
    /// Nothing is written until the first mutation.
    pub fn open_with_ids(repo: R, ids: G) -> StoreResult<Self> {
        let state = match repo.load_snapshot() {
            Ok(Some(state)) => state,
            Ok(None) => AppState::default(),
            Err(err) => {
                error!("event=store_open module=store status=error error={err}");
                return Err(err.into());
            }
        };
        info!(
            "event=store_open module=store status=ok routines={} checks={} schedules={} diaries={}",
            state.routines.len(),
            state.check_statuses.len(),
            state.schedules.len(),
            state.diaries.len()
        );
        Ok(Self { repo, ids, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Commits a host-supplied pure transition.
    pub fn apply(
        &mut self,
        op: &'static str,
        transition: impl FnOnce(AppState) -> AppState,
    ) -> StoreResult<()> {
        self.commit(op, |state, _| Ok((transition(state), ())))
    }

    pub fn add_routine(
        &mut self,
        text: &str,
        days: impl IntoIterator<Item = u8>,
    ) -> StoreResult<RoutineId> {
        self.commit("add_routine", |state, ids| {
            Ok(transition::add_routine(state, text, days, ids)?)
        })
    }

    pub fn delete_routine(&mut self, id: RoutineId) -> StoreResult<()> {
        self.commit("delete_routine", |state, _| {
            Ok((transition::delete_routine(state, id)?, ()))
        })
    }

    pub fn set_routine_active(&mut self, id: RoutineId, active: bool) -> StoreResult<()> {
        self.commit("set_routine_active", |state, _| {
            Ok((transition::set_routine_active(state, id, active)?, ()))
        })
    }

    pub fn move_routine(&mut self, id: RoutineId, direction: MoveDirection) -> StoreResult<()> {
        self.commit("move_routine", |state, _| {
            Ok((transition::move_routine(state, id, direction)?, ()))
        })
    }

    /// Flips completion and returns the resulting flag.
    pub fn toggle_check(&mut self, date: NaiveDate, template_id: RoutineId) -> StoreResult<bool> {
        self.commit("toggle_check", |state, _| {
            let next = transition::toggle_check(state, date, template_id)?;
            let completed = next.is_completed(date, template_id);
            Ok((next, completed))
        })
    }

    pub fn add_schedule(&mut self, request: NewSchedule) -> StoreResult<ScheduleId> {
        self.commit("add_schedule", |state, ids| {
            Ok(transition::add_schedule(state, request, ids)?)
        })
    }

    pub fn remove_schedule(&mut self, id: ScheduleId) -> StoreResult<()> {
        self.commit("remove_schedule", |state, _| {
            Ok((transition::remove_schedule(state, id)?, ()))
        })
    }

    pub fn update_diary(&mut self, date: NaiveDate, content: &str) -> StoreResult<()> {
        self.commit("update_diary", |state, _| {
            Ok((transition::update_diary(state, date, content), ()))
        })
    }

    /// Imports a backup document by merging or replacing.
    ///
    /// # Errors
    /// - `Backup(Malformed)` when the document cannot be decoded; the current
    ///   state is left untouched.
    pub fn import_backup(&mut self, document: &str, mode: ImportMode) -> StoreResult<BackupImport> {
        let incoming = decode_backup(document).inspect_err(|_| {
            warn!("event=backup_import module=store status=rejected mode={mode} error_code=malformed");
        })?;

        match mode {
            ImportMode::Merge => {
                let summary = self.commit("import_merge", |state, _| {
                    Ok(transition::apply_merge(state, &incoming))
                })?;
                info!(
                    "event=backup_import module=store status=ok mode=merge routines_added={} routines_replaced={} checks_added={} checks_completed={} schedules_added={} schedules_replaced={} diaries_added={} diaries_combined={}",
                    summary.routines_added,
                    summary.routines_replaced,
                    summary.checks_added,
                    summary.checks_completed,
                    summary.schedules_added,
                    summary.schedules_replaced,
                    summary.diaries_added,
                    summary.diaries_combined
                );
                Ok(BackupImport::Merged(summary))
            }
            ImportMode::Replace => {
                self.commit("import_replace", |state, _| {
                    Ok((transition::apply_replace(state, incoming), ()))
                })?;
                Ok(BackupImport::Replaced)
            }
        }
    }

    /// Serializes the current state for download.
    pub fn export_backup(&self, today: NaiveDate) -> StoreResult<BackupExport> {
        let document = encode_backup(&self.state)?;
        let file_name = backup_file_name(today);
        info!(
            "event=backup_export module=store status=ok bytes={}",
            document.len()
        );
        Ok(BackupExport {
            file_name,
            document,
        })
    }

    /// Imports calendar events as schedules, skipping `(date, text)` repeats.
    ///
    /// # Errors
    /// - `Calendar(NoEvents)` when nothing importable was found; no write
    ///   happens.
    pub fn import_calendar(&mut self, calendar_text: &str) -> StoreResult<CalendarImport> {
        let outcome = self.commit("import_calendar", |state, ids| {
            let merged = transition::apply_calendar_import(state, calendar_text, ids)?;
            let outcome = CalendarImport {
                added: merged.added,
                duplicates: merged.duplicates,
            };
            Ok((merged.state, outcome))
        })?;
        info!(
            "event=calendar_import module=store status=ok added={} duplicates={}",
            outcome.added, outcome.duplicates
        );
        Ok(outcome)
    }

    fn commit<T>(
        &mut self,
        op: &'static str,
        transition: impl FnOnce(AppState, &mut dyn IdGenerator) -> StoreResult<(AppState, T)>,
    ) -> StoreResult<T> {
        let (next, output) = match transition(self.state.clone(), &mut self.ids) {
            Ok(result) => result,
            Err(err) => {
                warn!("event=state_commit module=store status=rejected op={op} error={err}");
                return Err(err);
            }
        };

        if let Err(err) = next.validate() {
            warn!("event=state_commit module=store status=rejected op={op} error={err}");
            return Err(err.into());
        }

        if let Err(err) = self.repo.save_snapshot(&next) {
            error!("event=state_commit module=store status=error op={op} error={err}");
            return Err(err.into());
        }

        self.state = next;
        info!("event=state_commit module=store status=ok op={op}");
        Ok(output)
    }
}

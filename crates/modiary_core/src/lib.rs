//! Core domain logic for MoDiary.
//! This crate owns state reconciliation, calendar import, analytics and
//! persistence; host layers only hold the single `StateStore`.

pub mod analytics;
pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod reflection;
pub mod repo;
pub mod search;
pub mod service;
pub mod sync;

pub use analytics::completion::{daily_completion_ratio, routines_for_date};
pub use analytics::monthly::{
    days_in_month, monthly_diaries, monthly_routine_stats, monthly_summary, MonthlySummary,
    RoutineMonthStat,
};
pub use config::{ConfigError, CoreConfig, ReflectionConfig};
pub use import::backup::{backup_file_name, BackupError, ImportMode};
pub use import::calendar::{parse_calendar, CalendarCandidate, CalendarImportError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingStatus};
pub use model::id::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use model::state::{
    weekday_index, AppState, CheckStatus, DiaryEntry, RecurrenceKind, RoutineId,
    RoutineTemplate, Schedule, ScheduleId, StateValidationError, DEFAULT_SCHEDULE_COLOR,
    SCHEDULE_COLORS,
};
pub use reflection::client::{
    reflect_or_fallback, DisabledReflectionService, GeminiReflectionService, ReflectionError,
    ReflectionService,
};
pub use reflection::tracker::{ReflectionTicket, ReflectionTracker};
pub use repo::state_repo::{RepoError, RepoResult, SqliteStateRepository, StateRepository};
pub use search::text::{search, SearchHit, SearchKind, SearchQuery};
pub use service::state_store::{
    BackupExport, BackupImport, CalendarImport, StateStore, StoreError, StoreResult,
};
pub use service::transition::{MoveDirection, NewSchedule, TransitionError};
pub use sync::merge::{merge, merge_with_summary, MergeSummary};

/// Minimal health-check API for host wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

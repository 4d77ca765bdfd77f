//! Snapshot repository contracts and SQLite key-value implementation.
//!
//! # Responsibility
//! - Persist the full `AppState` as one JSON document under a single key.
//! - Decode stored documents through the lenient, defaulting model decoder.
//!
//! # Invariants
//! - `save_snapshot` overwrites the whole document in one statement.
//! - A missing key loads as `None`, never as an error.

use crate::db::DbError;
use crate::model::state::AppState;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key under which the application snapshot is stored.
pub const STATE_KEY: &str = "modiary_data";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
    /// Stored document exists but cannot be decoded into a valid state.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for whole-aggregate snapshots.
pub trait StateRepository {
    fn load_snapshot(&self) -> RepoResult<Option<AppState>>;
    fn save_snapshot(&self, state: &AppState) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository over the `kv_store` table.
pub struct SqliteStateRepository<'conn> {
    conn: &'conn Connection,
    key: &'static str,
}

impl<'conn> SqliteStateRepository<'conn> {
    /// Stores the snapshot under [`STATE_KEY`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            key: STATE_KEY,
        }
    }

    pub fn key(&self) -> &str {
        self.key
    }
}

impl StateRepository for SqliteStateRepository<'_> {
    fn load_snapshot(&self) -> RepoResult<Option<AppState>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            debug!("event=snapshot_load module=repo status=empty key={}", self.key);
            return Ok(None);
        };

        let state = serde_json::from_str::<AppState>(&raw).map_err(|err| {
            error!(
                "event=snapshot_load module=repo status=error key={} error_code=decode_failed",
                self.key
            );
            RepoError::InvalidData(err.to_string())
        })?;

        debug!(
            "event=snapshot_load module=repo status=ok key={} bytes={}",
            self.key,
            raw.len()
        );
        Ok(Some(state))
    }

    fn save_snapshot(&self, state: &AppState) -> RepoResult<()> {
        let encoded = serde_json::to_string(state).map_err(RepoError::Encode)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.key, encoded.as_str()],
        )?;

        debug!(
            "event=snapshot_save module=repo status=ok key={} bytes={}",
            self.key,
            encoded.len()
        );
        Ok(())
    }
}

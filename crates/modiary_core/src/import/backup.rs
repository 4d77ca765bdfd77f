//! Whole-state backup documents.
//!
//! # Responsibility
//! - Encode `AppState` as a pretty JSON export with a dated file name.
//! - Decode imported documents with the same defaults applied on load.

use crate::model::state::AppState;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// File name prefix of exported backups.
pub const BACKUP_FILE_PREFIX: &str = "modiary_backup";

/// How an imported backup is combined with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Reconcile through the merge engine.
    Merge,
    /// Discard the current state entirely.
    Replace,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
        }
    }
}

impl Display for ImportMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = BackupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            other => Err(BackupError::UnsupportedMode(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum BackupError {
    /// Document is not valid JSON or violates state invariants.
    Malformed(String),
    Encode(serde_json::Error),
    UnsupportedMode(String),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed backup document: {message}"),
            Self::Encode(err) => write!(f, "failed to encode backup: {err}"),
            Self::UnsupportedMode(value) => {
                write!(f, "unsupported import mode `{value}`; expected merge|replace")
            }
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

/// Returns `modiary_backup_yyyyMMdd.json` for the given day.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}_{}.json", date.format("%Y%m%d"))
}

pub fn encode_backup(state: &AppState) -> Result<String, BackupError> {
    serde_json::to_string_pretty(state).map_err(BackupError::Encode)
}

pub fn decode_backup(text: &str) -> Result<AppState, BackupError> {
    serde_json::from_str(text).map_err(|err| BackupError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, decode_backup, BackupError, ImportMode};
    use chrono::NaiveDate;

    #[test]
    fn file_name_embeds_compact_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(backup_file_name(date), "modiary_backup_20240305.json");
    }

    #[test]
    fn import_mode_parses_case_insensitively() {
        assert_eq!(" Merge ".parse::<ImportMode>().unwrap(), ImportMode::Merge);
        assert_eq!("REPLACE".parse::<ImportMode>().unwrap(), ImportMode::Replace);
        assert!(matches!(
            "append".parse::<ImportMode>(),
            Err(BackupError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            decode_backup("not json"),
            Err(BackupError::Malformed(_))
        ));
    }
}

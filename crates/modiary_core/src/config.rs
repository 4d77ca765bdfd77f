//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve database path, log settings and reflection service settings.
//! - Provide a lookup seam so tests never mutate the process environment.
//!
//! # Invariants
//! - `log_dir` is always absolute (required by logging bootstrap).
//! - Blank variables behave as unset.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "MODIARY_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MODIARY_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MODIARY_LOG_DIR";
pub const ENV_API_KEY: &str = "MODIARY_GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "GEMINI_API_KEY";
pub const ENV_REFLECTION_MODEL: &str = "MODIARY_REFLECTION_MODEL";
pub const ENV_REFLECTION_TIMEOUT_SECS: &str = "MODIARY_REFLECTION_TIMEOUT_SECS";

const APP_DIR_NAME: &str = "modiary";
const DB_FILE_NAME: &str = "modiary.sqlite3";
const LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_REFLECTION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REFLECTION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    ResolvePath { path: PathBuf, source: std::io::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer, got `{value}`")
            }
            Self::ResolvePath { path, source } => {
                write!(f, "failed to resolve path `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ResolvePath { source, .. } => Some(source),
            Self::InvalidNumber { .. } => None,
        }
    }
}

/// Settings for the diary reflection service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionConfig {
    /// `None` disables remote calls; callers get the fallback message.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_REFLECTION_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REFLECTION_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub reflection: ReflectionConfig,
}

impl CoreConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let log_dir = match get(ENV_LOG_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => db_path
                .parent()
                .map_or_else(|| PathBuf::from(LOG_DIR_NAME), |dir| dir.join(LOG_DIR_NAME)),
        };
        let log_dir = absolutize(&log_dir)?;

        let log_level = get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());

        let timeout_secs = match get(ENV_REFLECTION_TIMEOUT_SECS) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: ENV_REFLECTION_TIMEOUT_SECS,
                    value: raw,
                })?,
            None => DEFAULT_REFLECTION_TIMEOUT_SECS,
        };

        let reflection = ReflectionConfig {
            api_key: get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_FALLBACK)),
            model: get(ENV_REFLECTION_MODEL)
                .unwrap_or_else(|| DEFAULT_REFLECTION_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            reflection,
        })
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::path::absolute(path).map_err(|source| ConfigError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })
}

//! Error types for paddock-engine operations.

use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`ScheduleProvider`](crate::schedule::ScheduleProvider).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("season {0} has not been published")]
    SeasonNotPublished(i32),

    #[error("schedule source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed schedule data: {0}")]
    Malformed(String),

    #[error("schedule fetch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("schedule fetch cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Schedule unavailable for season {season}")]
    ScheduleUnavailable {
        season: i32,
        #[source]
        source: ProviderError,
    },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Cache record corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Cache write failed: {0}")]
    CacheWriteFailed(String),

    #[error("Invalid verbosity: '{0}' (expected minimal, normal or detailed)")]
    InvalidVerbosity(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Errors that can occur when loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

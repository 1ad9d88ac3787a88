//! Schedule input model and the provider seam.
//!
//! A [`ScheduleProvider`] hands the engine a [`SeasonSchedule`]: events with
//! a round number, location metadata and an ordered list of sessions. The
//! engine never talks to the upstream source directly; it only sees this
//! model, which keeps analysis deterministic and testable.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, ProviderError};

// ── Session types ───────────────────────────────────────────────────────────

/// Session type code. Serialized as the short code (`"FP1"`, `"Q"`, `"R"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "FP1")]
    Practice1,
    #[serde(rename = "FP2")]
    Practice2,
    #[serde(rename = "FP3")]
    Practice3,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "SQ")]
    SprintQualifying,
    #[serde(rename = "S")]
    Sprint,
    #[serde(rename = "R")]
    Race,
    #[serde(rename = "TEST")]
    Testing,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl SessionType {
    /// Infer the type from a display name such as `"Practice 2"` or `"Sprint Shootout"`.
    pub fn from_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "practice 1" | "free practice 1" | "fp1" => Self::Practice1,
            "practice 2" | "free practice 2" | "fp2" => Self::Practice2,
            "practice 3" | "free practice 3" | "fp3" => Self::Practice3,
            "qualifying" | "q" => Self::Qualifying,
            "sprint qualifying" | "sprint shootout" | "sq" => Self::SprintQualifying,
            "sprint" | "s" => Self::Sprint,
            "race" | "r" | "grand prix" => Self::Race,
            _ if lower.contains("test") || lower.starts_with("day ") => Self::Testing,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Practice1 => "FP1",
            Self::Practice2 => "FP2",
            Self::Practice3 => "FP3",
            Self::Qualifying => "Q",
            Self::SprintQualifying => "SQ",
            Self::Sprint => "S",
            Self::Race => "R",
            Self::Testing => "TEST",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_sprint(self) -> bool {
        matches!(self, Self::Sprint | Self::SprintQualifying)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ── Schedule model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub name: String,
    /// Explicit type code; inferred from `name` when absent.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
    pub start_utc: DateTime<Utc>,
    /// Wall-clock start at the circuit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_local: Option<NaiveDateTime>,
    /// Published end time, when the source has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_utc: Option<DateTime<Utc>>,
}

impl ScheduledSession {
    pub fn new(name: impl Into<String>, start_utc: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            session_type: None,
            start_utc,
            start_local: None,
            end_utc: None,
        }
    }

    pub fn resolved_type(&self) -> SessionType {
        self.session_type
            .unwrap_or_else(|| SessionType::from_name(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub round: u32,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub location: String,
    /// Reference date of the event (usually the main race day).
    pub event_date: DateTime<Utc>,
    /// Free-form format label from the source, e.g. `"conventional"` or `"sprint_qualifying"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// IANA timezone of the circuit, used to derive local session times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub sessions: Vec<ScheduledSession>,
}

impl ScheduledEvent {
    /// Local wall-clock start of `session`.
    ///
    /// Uses the explicit `start_local` when present, otherwise converts the
    /// UTC start into the event timezone, otherwise falls back to UTC.
    pub fn local_start(&self, session: &ScheduledSession) -> Result<NaiveDateTime, EngineError> {
        if let Some(local) = session.start_local {
            return Ok(local);
        }
        match &self.timezone {
            Some(tz) => {
                let tz = parse_timezone(tz).map_err(|e| {
                    EngineError::InvalidSchedule(format!("round {}: {e}", self.round))
                })?;
                Ok(session.start_utc.with_timezone(&tz).naive_local())
            }
            None => Ok(session.start_utc.naive_utc()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSchedule {
    pub season: i32,
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl SeasonSchedule {
    pub fn new(season: i32, events: Vec<ScheduledEvent>) -> Self {
        Self { season, events }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(s).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    /// Read a schedule document from disk.
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }
}

// ── Provider seam ───────────────────────────────────────────────────────────

/// Shared cancellation flag for an in-flight fetch.
///
/// Clones observe the same flag. The manager stops waiting as soon as it is
/// set; providers that loop or retry may also poll it through
/// [`FetchRequest::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Two tokens are equal when they share a flag.
impl PartialEq for CancelToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

impl Eq for CancelToken {}

/// Per-call options passed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Skip any provider-side cache (set on forced refresh).
    pub bypass_cache: bool,
    /// Upper bound on how long the provider may take. The manager stops
    /// waiting once it elapses.
    pub timeout: Duration,
    pub cancel: CancelToken,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            bypass_cache: false,
            timeout: Duration::from_secs(10),
            cancel: CancelToken::new(),
        }
    }
}

/// Read-only source of season schedules.
///
/// Fetches run on a worker thread so the manager can enforce
/// [`FetchRequest::timeout`]; a fetch abandoned on timeout or cancellation
/// finishes in the background and its result is dropped.
pub trait ScheduleProvider: Send + Sync + 'static {
    fn fetch_schedule(
        &self,
        season: i32,
        request: &FetchRequest,
    ) -> Result<SeasonSchedule, ProviderError>;
}

impl<P: ScheduleProvider + ?Sized> ScheduleProvider for Arc<P> {
    fn fetch_schedule(
        &self,
        season: i32,
        request: &FetchRequest,
    ) -> Result<SeasonSchedule, ProviderError> {
        (**self).fetch_schedule(season, request)
    }
}

impl<P: ScheduleProvider + ?Sized> ScheduleProvider for Box<P> {
    fn fetch_schedule(
        &self,
        season: i32,
        request: &FetchRequest,
    ) -> Result<SeasonSchedule, ProviderError> {
        (**self).fetch_schedule(season, request)
    }
}

/// Reads `<dir>/<season>.json` schedule documents.
#[derive(Debug, Clone)]
pub struct JsonScheduleProvider {
    dir: PathBuf,
}

impl JsonScheduleProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn season_path(&self, season: i32) -> PathBuf {
        self.dir.join(format!("{season}.json"))
    }
}

impl ScheduleProvider for JsonScheduleProvider {
    fn fetch_schedule(
        &self,
        season: i32,
        request: &FetchRequest,
    ) -> Result<SeasonSchedule, ProviderError> {
        if request.cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let path = self.season_path(season);
        debug!(path = %path.display(), bypass_cache = request.bypass_cache, "reading schedule file");
        if !path.exists() {
            return Err(ProviderError::SeasonNotPublished(season));
        }
        let schedule = SeasonSchedule::load(&path)?;
        if schedule.season != season {
            return Err(ProviderError::Malformed(format!(
                "{} declares season {}, expected {season}",
                path.display(),
                schedule.season
            )));
        }
        Ok(schedule)
    }
}

/// In-memory provider. Counts fetches and can be told to fail.
#[derive(Debug, Default)]
pub struct StaticScheduleProvider {
    seasons: Mutex<HashMap<i32, SeasonSchedule>>,
    failure: Mutex<Option<ProviderError>>,
    fetches: AtomicUsize,
    last_request: Mutex<Option<(i32, FetchRequest)>>,
}

impl StaticScheduleProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(schedule: SeasonSchedule) -> Self {
        let provider = Self::new();
        provider.insert(schedule);
        provider
    }

    pub fn insert(&self, schedule: SeasonSchedule) {
        self.seasons.lock().insert(schedule.season, schedule);
    }

    /// Make every following fetch fail with `error` (`None` restores normal behavior).
    pub fn set_failure(&self, error: Option<ProviderError>) {
        *self.failure.lock() = error;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(i32, FetchRequest)> {
        self.last_request.lock().clone()
    }
}

impl ScheduleProvider for StaticScheduleProvider {
    fn fetch_schedule(
        &self,
        season: i32,
        request: &FetchRequest,
    ) -> Result<SeasonSchedule, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some((season, request.clone()));
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.seasons
            .lock()
            .get(&season)
            .cloned()
            .ok_or(ProviderError::SeasonNotPublished(season))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>().map_err(|_| format!("invalid timezone '{s}'"))
}

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("'{s}': {e}"))
}

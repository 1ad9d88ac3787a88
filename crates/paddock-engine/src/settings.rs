//! Layered engine settings.
//!
//! Loading flow:
//! 1. Start with compiled [`Settings::default()`]
//! 2. If `~/.paddock/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `PADDOCK_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SettingsError;
use crate::schedule::SessionType;

pub type Result<T> = std::result::Result<T, SettingsError>;

// ── Analyzer policy ─────────────────────────────────────────────────────────

/// Windows and margins used to classify season, weekend and session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerPolicy {
    /// How long before the first weekend window the season counts as pre-season.
    pub pre_season_margin_days: i64,
    /// Grace period after the final weekend window before post-season starts.
    pub post_season_margin_hours: i64,
    /// After this many days past the final weekend window, the season is off-season.
    pub off_season_after_days: i64,
    /// A weekend becomes "current" this long before its first session.
    pub pre_weekend_buffer_hours: i64,
    /// A weekend stays "current" this long after its last session ends.
    pub post_weekend_buffer_hours: i64,
    /// A finished session is "recent" for this long after it ends.
    pub recent_window_hours: i64,
    pub session_durations: SessionDurations,
}

impl Default for AnalyzerPolicy {
    fn default() -> Self {
        Self {
            pre_season_margin_days: 14,
            post_season_margin_hours: 0,
            off_season_after_days: 28,
            pre_weekend_buffer_hours: 48,
            post_weekend_buffer_hours: 6,
            recent_window_hours: 24,
            session_durations: SessionDurations::default(),
        }
    }
}

/// Largest accepted margin or buffer, in days.
pub const MAX_MARGIN_DAYS: i64 = 366;
/// Largest accepted estimated session length, in minutes.
pub const MAX_SESSION_MINUTES: i64 = 7 * 24 * 60;
/// Largest accepted TTL, in seconds.
pub const MAX_TTL_SECONDS: u64 = 366 * 24 * 60 * 60;

// Accessors saturate instead of panicking; unvalidated policies built in code
// then fail in the analyzer's checked arithmetic.
impl AnalyzerPolicy {
    pub fn pre_season_margin(&self) -> TimeDelta {
        days(self.pre_season_margin_days)
    }

    pub fn post_season_margin(&self) -> TimeDelta {
        hours(self.post_season_margin_hours)
    }

    pub fn off_season_after(&self) -> TimeDelta {
        days(self.off_season_after_days)
    }

    pub fn pre_weekend_buffer(&self) -> TimeDelta {
        hours(self.pre_weekend_buffer_hours)
    }

    pub fn post_weekend_buffer(&self) -> TimeDelta {
        hours(self.post_weekend_buffer_hours)
    }

    pub fn recent_window(&self) -> TimeDelta {
        hours(self.recent_window_hours)
    }

    fn margins_in_hours(&self) -> [(&'static str, i64); 6] {
        [
            ("pre_season_margin_days", self.pre_season_margin_days.saturating_mul(24)),
            ("post_season_margin_hours", self.post_season_margin_hours),
            ("off_season_after_days", self.off_season_after_days.saturating_mul(24)),
            ("pre_weekend_buffer_hours", self.pre_weekend_buffer_hours),
            ("post_weekend_buffer_hours", self.post_weekend_buffer_hours),
            ("recent_window_hours", self.recent_window_hours),
        ]
    }
}

fn days(n: i64) -> TimeDelta {
    TimeDelta::try_days(n).unwrap_or(if n < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}

fn hours(n: i64) -> TimeDelta {
    TimeDelta::try_hours(n).unwrap_or(if n < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}

/// Estimated session lengths in minutes, used when a schedule has no explicit end time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDurations {
    pub practice: i64,
    pub qualifying: i64,
    pub sprint_qualifying: i64,
    pub sprint: i64,
    pub race: i64,
    pub testing: i64,
    pub other: i64,
}

impl Default for SessionDurations {
    fn default() -> Self {
        Self {
            practice: 90,
            qualifying: 90,
            sprint_qualifying: 60,
            sprint: 60,
            race: 150,
            testing: 540,
            other: 120,
        }
    }
}

impl SessionDurations {
    pub fn for_type(&self, session_type: SessionType) -> TimeDelta {
        let minutes = match session_type {
            SessionType::Practice1 | SessionType::Practice2 | SessionType::Practice3 => {
                self.practice
            }
            SessionType::Qualifying => self.qualifying,
            SessionType::SprintQualifying => self.sprint_qualifying,
            SessionType::Sprint => self.sprint,
            SessionType::Race => self.race,
            SessionType::Testing => self.testing,
            SessionType::Unknown => self.other,
        };
        TimeDelta::try_minutes(minutes).unwrap_or(if minutes < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        })
    }

    fn all(&self) -> [(&'static str, i64); 7] {
        [
            ("practice", self.practice),
            ("qualifying", self.qualifying),
            ("sprint_qualifying", self.sprint_qualifying),
            ("sprint", self.sprint),
            ("race", self.race),
            ("testing", self.testing),
            ("other", self.other),
        ]
    }
}

// ── TTL policy ──────────────────────────────────────────────────────────────

/// One step of the adaptive TTL ladder: sessions closer than `below_minutes` get `ttl_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlTier {
    pub below_minutes: i64,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    /// Ordered by `below_minutes`, nearest first.
    pub tiers: Vec<TtlTier>,
    /// TTL when no tier matches or no session is known.
    pub fallback_seconds: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                TtlTier {
                    below_minutes: 60,
                    ttl_seconds: 5 * 60,
                },
                TtlTier {
                    below_minutes: 24 * 60,
                    ttl_seconds: 30 * 60,
                },
                TtlTier {
                    below_minutes: 7 * 24 * 60,
                    ttl_seconds: 6 * 60 * 60,
                },
            ],
            fallback_seconds: 24 * 60 * 60,
        }
    }
}

// ── Cache / provider / logging ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Location of the single cache record.
    pub path: PathBuf,
    pub ttl: TtlPolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: paddock_home()
                .join("cache")
                .join("temporal")
                .join("context_cache.json"),
            ttl: TtlPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Directory holding `<season>.json` schedule files.
    pub schedule_dir: PathBuf,
    pub fetch_timeout_ms: u64,
    /// Retry once with the previous year when the current season is not published.
    pub previous_season_fallback: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            schedule_dir: paddock_home().join("schedules"),
            fetch_timeout_ms: 10_000,
            previous_season_fallback: true,
        }
    }
}

impl ProviderSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive. `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analyzer: AnalyzerPolicy,
    pub cache: CacheSettings,
    pub provider: ProviderSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Reject values that would break the analyzer or the TTL ladder.
    pub fn validate(&self) -> Result<()> {
        for (name, minutes) in self.analyzer.session_durations.all() {
            if minutes <= 0 || minutes > MAX_SESSION_MINUTES {
                return Err(SettingsError::InvalidValue(format!(
                    "session duration '{name}' must be between 1 and {MAX_SESSION_MINUTES} minutes, got {minutes}"
                )));
            }
        }

        let a = &self.analyzer;
        for (name, hours) in a.margins_in_hours() {
            if hours < 0 {
                return Err(SettingsError::InvalidValue(format!(
                    "analyzer {name} must not be negative"
                )));
            }
            if hours > MAX_MARGIN_DAYS * 24 {
                return Err(SettingsError::InvalidValue(format!(
                    "analyzer {name} must not exceed {MAX_MARGIN_DAYS} days"
                )));
            }
        }
        if a.off_season_after() < a.post_season_margin() {
            return Err(SettingsError::InvalidValue(
                "off_season_after_days must cover post_season_margin_hours".to_string(),
            ));
        }

        let ttl = &self.cache.ttl;
        for pair in ttl.tiers.windows(2) {
            if pair[1].below_minutes <= pair[0].below_minutes {
                return Err(SettingsError::InvalidValue(format!(
                    "TTL tiers must be ordered by below_minutes ({} then {})",
                    pair[0].below_minutes, pair[1].below_minutes
                )));
            }
            if pair[1].ttl_seconds < pair[0].ttl_seconds {
                return Err(SettingsError::InvalidValue(format!(
                    "TTL must not shrink as sessions get further away ({}s then {}s)",
                    pair[0].ttl_seconds, pair[1].ttl_seconds
                )));
            }
        }
        if let Some(last) = ttl.tiers.last() {
            if ttl.fallback_seconds < last.ttl_seconds {
                return Err(SettingsError::InvalidValue(
                    "fallback TTL must be at least the widest tier TTL".to_string(),
                ));
            }
        }
        if ttl.tiers.iter().any(|t| t.ttl_seconds == 0) || ttl.fallback_seconds == 0 {
            return Err(SettingsError::InvalidValue(
                "TTL values must be positive".to_string(),
            ));
        }
        if ttl.fallback_seconds > MAX_TTL_SECONDS {
            return Err(SettingsError::InvalidValue(format!(
                "TTL values must not exceed {MAX_TTL_SECONDS} seconds"
            )));
        }

        if self.provider.fetch_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "fetch_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// `~/.paddock`, or `/tmp/.paddock` when `HOME` is unset.
pub fn paddock_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".paddock")
}

/// Resolve the path to the settings file (`~/.paddock/settings.json`).
pub fn settings_path() -> PathBuf {
    paddock_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<Settings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, or the merged result fails validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<Settings> {
    let defaults = serde_json::to_value(Settings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PADDOCK_*` environment overrides. Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = read_env_string("PADDOCK_CACHE_PATH") {
        settings.cache.path = PathBuf::from(v);
    }
    if let Some(v) = read_env_string("PADDOCK_SCHEDULE_DIR") {
        settings.provider.schedule_dir = PathBuf::from(v);
    }
    if let Some(v) = read_env_u64("PADDOCK_FETCH_TIMEOUT_MS", 1, 600_000) {
        settings.provider.fetch_timeout_ms = v;
    }
    if let Some(v) = read_env_bool("PADDOCK_PREVIOUS_SEASON_FALLBACK") {
        settings.provider.previous_season_fallback = v;
    }
    if let Some(v) = read_env_string("PADDOCK_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("PADDOCK_LOG_JSON") {
        settings.logging.json = v;
    }
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── deep_merge ──────────────────────────────────────────────────────

    #[test]
    fn test_merge_nested_override() {
        let target = serde_json::json!({"analyzer": {"pre_weekend_buffer_hours": 48, "recent_window_hours": 24}});
        let source = serde_json::json!({"analyzer": {"pre_weekend_buffer_hours": 72}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["analyzer"]["pre_weekend_buffer_hours"], 72);
        assert_eq!(merged["analyzer"]["recent_window_hours"], 24);
    }

    #[test]
    fn test_merge_null_preserves_target() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn test_merge_array_replaces() {
        let merged = deep_merge(
            serde_json::json!({"tiers": [1, 2, 3]}),
            serde_json::json!({"tiers": [9]}),
        );
        assert_eq!(merged["tiers"], serde_json::json!([9]));
    }

    // ── load_settings_from_path ─────────────────────────────────────────

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.analyzer, AnalyzerPolicy::default());
        assert_eq!(settings.cache.ttl, TtlPolicy::default());
    }

    #[test]
    fn test_load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"analyzer": {"session_durations": {"race": 180}}, "provider": {"fetch_timeout_ms": 2500}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.analyzer.session_durations.race, 180);
        assert_eq!(settings.analyzer.session_durations.practice, 90);
        assert_eq!(settings.provider.fetch_timeout_ms, 2500);
        assert!(settings.provider.previous_season_fallback);
    }

    #[test]
    fn test_load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_file_layer(&path);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    // ── validate ────────────────────────────────────────────────────────

    #[test]
    fn test_default_settings_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_unordered_tiers() {
        let mut settings = Settings::default();
        settings.cache.ttl.tiers.swap(0, 1);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("ordered"), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_ttl_growing_near_sessions() {
        let mut settings = Settings::default();
        settings.cache.ttl.tiers[0].ttl_seconds = 7200;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut settings = Settings::default();
        settings.analyzer.session_durations.sprint = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sprint"), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_oversized_margin_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"analyzer": {"pre_season_margin_days": 200000000}}"#).unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        assert!(err.to_string().contains("pre_season_margin_days"), "got: {err}");
    }

    #[test]
    fn test_validate_bounds_durations_buffers_and_ttl() {
        let mut settings = Settings::default();
        settings.analyzer.session_durations.race = MAX_SESSION_MINUTES + 1;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.analyzer.post_weekend_buffer_hours = i64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("post_weekend_buffer_hours"), "got: {err}");

        let mut settings = Settings::default();
        settings.analyzer.off_season_after_days = MAX_MARGIN_DAYS;
        settings.validate().unwrap();

        let mut settings = Settings::default();
        settings.cache.ttl.fallback_seconds = u64::MAX;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_policy_accessors_saturate() {
        let policy = AnalyzerPolicy {
            pre_season_margin_days: i64::MAX,
            recent_window_hours: i64::MIN,
            ..AnalyzerPolicy::default()
        };
        assert_eq!(policy.pre_season_margin(), TimeDelta::MAX);
        assert_eq!(policy.recent_window(), TimeDelta::MIN);
    }

    #[test]
    fn test_durations_by_session_type() {
        let d = SessionDurations::default();
        assert_eq!(d.for_type(SessionType::Race), TimeDelta::minutes(150));
        assert_eq!(d.for_type(SessionType::Practice2), TimeDelta::minutes(90));
        assert_eq!(d.for_type(SessionType::Unknown), TimeDelta::minutes(120));
    }

    // ── parsing helpers ─────────────────────────────────────────────────

    #[test]
    fn test_parse_bool_variants() {
        for val in &["true", "1", "yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "No", "off"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("2500", 1, 600_000), Some(2500));
        assert_eq!(parse_u64_range("0", 1, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1, 600_000), None);
    }
}

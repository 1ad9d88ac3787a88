//! Context orchestration: cache lookup, schedule fetch, analysis, write-through.
//!
//! [`TemporalContextManager`] holds no analysis logic. It sequences I/O
//! around [`analyze`](crate::analyzer::analyze) and decides what to do when
//! the provider fails: serve the last record (even expired) if there is
//! one, otherwise report [`EngineError::ScheduleUnavailable`].
//!
//! The fetch runs on a worker thread. The manager waits at most the fetch
//! timeout and stops early when the caller's [`CancelToken`] is set; both
//! count as provider failures and fall back to the stale record.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer::analyze;
use crate::cache::{CacheRecord, TemporalCache};
use crate::error::{EngineError, ProviderError, Result};
use crate::schedule::{
    CancelToken, FetchRequest, JsonScheduleProvider, ScheduleProvider, SeasonSchedule,
};
use crate::settings::{AnalyzerPolicy, Settings};
use crate::snapshot::TemporalSnapshot;

/// How often a pending fetch checks its cancel token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Where a resolved snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Valid cache record.
    Cached,
    /// Freshly analyzed.
    Fresh,
    /// Expired record served because the provider failed.
    Stale,
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cached => "cached",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub snapshot: TemporalSnapshot,
    pub source: ContextSource,
    /// Record the snapshot was served from or written to.
    pub record: CacheRecord,
}

pub struct TemporalContextManager<P> {
    provider: Arc<P>,
    cache: TemporalCache,
    policy: AnalyzerPolicy,
    fetch_timeout: Duration,
    previous_season_fallback: bool,
}

impl<P: ScheduleProvider> TemporalContextManager<P> {
    pub fn new(provider: P, cache: TemporalCache) -> Self {
        Self {
            provider: Arc::new(provider),
            cache,
            policy: AnalyzerPolicy::default(),
            fetch_timeout: FetchRequest::default().timeout,
            previous_season_fallback: true,
        }
    }

    pub fn with_policy(mut self, policy: AnalyzerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_previous_season_fallback(mut self, enabled: bool) -> Self {
        self.previous_season_fallback = enabled;
        self
    }

    pub fn cache(&self) -> &TemporalCache {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        self.provider.as_ref()
    }

    /// Snapshot for `now`, from cache when valid unless `force_refresh` is set.
    ///
    /// # Errors
    ///
    /// [`EngineError::ScheduleUnavailable`] when the provider fails, times
    /// out or is cancelled and no record exists;
    /// [`EngineError::InvalidSchedule`] when the fetched schedule breaks the
    /// analyzer's invariants.
    pub fn get_context(&self, now: DateTime<Utc>, force_refresh: bool) -> Result<TemporalSnapshot> {
        self.resolve(now, force_refresh).map(|resolved| resolved.snapshot)
    }

    /// [`get_context`](Self::get_context) with a caller-held cancel token.
    pub fn get_context_cancellable(
        &self,
        now: DateTime<Utc>,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> Result<TemporalSnapshot> {
        self.resolve_cancellable(now, force_refresh, cancel)
            .map(|resolved| resolved.snapshot)
    }

    /// Like [`get_context`](Self::get_context), but reports the source and the cache record.
    pub fn resolve(&self, now: DateTime<Utc>, force_refresh: bool) -> Result<ResolvedContext> {
        self.resolve_cancellable(now, force_refresh, &CancelToken::new())
    }

    pub fn resolve_cancellable(
        &self,
        now: DateTime<Utc>,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> Result<ResolvedContext> {
        if !force_refresh {
            if let Some(record) = self.cache.get(now) {
                return Ok(ResolvedContext {
                    snapshot: record.snapshot.clone(),
                    source: ContextSource::Cached,
                    record,
                });
            }
        }

        let request = FetchRequest {
            bypass_cache: force_refresh,
            timeout: self.fetch_timeout,
            cancel: cancel.clone(),
        };

        let schedule = match self.fetch_bounded(now.year(), request) {
            Ok(schedule) => schedule,
            Err(EngineError::ScheduleUnavailable { season, source }) => {
                return self.stale_or(season, source);
            }
            Err(other) => return Err(other),
        };

        let snapshot = analyze(now, &schedule, &self.policy)?;
        let record = self.cache.put(snapshot.clone(), now);
        info!(
            season = snapshot.current_season,
            phase = %snapshot.season_phase,
            ttl_seconds = record.ttl_seconds,
            forced = force_refresh,
            "temporal context refreshed"
        );

        Ok(ResolvedContext {
            snapshot,
            source: ContextSource::Fresh,
            record,
        })
    }

    /// Explicit invalidation. Returns whether a record was removed.
    pub fn invalidate(&self) -> Result<bool> {
        self.cache.invalidate()
    }

    /// Run [`fetch_season`] on a worker thread, waiting until it answers,
    /// `request.timeout` elapses, or `request.cancel` is set.
    fn fetch_bounded(&self, season: i32, request: FetchRequest) -> Result<SeasonSchedule> {
        let unavailable =
            |source: ProviderError| EngineError::ScheduleUnavailable { season, source };
        let timeout = request.timeout;
        let cancel = request.cancel.clone();
        if cancel.is_cancelled() {
            return Err(unavailable(ProviderError::Cancelled));
        }

        // A timeout too large for `Instant` means no deadline.
        let deadline = Instant::now().checked_add(timeout);
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let fallback = self.previous_season_fallback;
        thread::Builder::new()
            .name("paddock-fetch".to_string())
            .spawn(move || {
                // Fails only when the manager already gave up on this fetch.
                let _ = tx.send(fetch_season(provider.as_ref(), season, &request, fallback));
            })
            .map_err(|e| {
                unavailable(ProviderError::Unavailable(format!(
                    "cannot start schedule fetch: {e}"
                )))
            })?;

        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        warn!(
                            season,
                            timeout_ms = timeout.as_millis() as u64,
                            "schedule fetch timed out"
                        );
                        return Err(unavailable(ProviderError::TimedOut(timeout)));
                    }
                    left.min(CANCEL_POLL_INTERVAL)
                }
                None => CANCEL_POLL_INTERVAL,
            };
            match rx.recv_timeout(wait) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => {
                    warn!(season, "schedule fetch cancelled");
                    return Err(unavailable(ProviderError::Cancelled));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(unavailable(ProviderError::Unavailable(
                        "schedule fetch panicked".to_string(),
                    )));
                }
            }
        }
    }

    fn stale_or(&self, season: i32, source: ProviderError) -> Result<ResolvedContext> {
        match self.cache.get_stale() {
            Some(record) => {
                warn!(
                    season,
                    error = %source,
                    cached_at = %record.cached_at,
                    "schedule unavailable, serving stale cache record"
                );
                Ok(ResolvedContext {
                    snapshot: record.snapshot.clone(),
                    source: ContextSource::Stale,
                    record,
                })
            }
            None => Err(EngineError::ScheduleUnavailable { season, source }),
        }
    }
}

/// Fetch `season`, falling back once to the previous year if it isn't published yet.
fn fetch_season<P: ScheduleProvider>(
    provider: &P,
    season: i32,
    request: &FetchRequest,
    previous_season_fallback: bool,
) -> Result<SeasonSchedule> {
    match provider.fetch_schedule(season, request) {
        Ok(schedule) => Ok(schedule),
        Err(ProviderError::SeasonNotPublished(_)) if previous_season_fallback => {
            let previous = season - 1;
            debug!(season, previous, "season not published, trying previous season");
            provider
                .fetch_schedule(previous, request)
                .map_err(|source| EngineError::ScheduleUnavailable {
                    season: previous,
                    source,
                })
        }
        Err(source) => Err(EngineError::ScheduleUnavailable { season, source }),
    }
}

impl TemporalContextManager<JsonScheduleProvider> {
    /// Manager over `<schedule_dir>/<season>.json` files with a file-backed cache.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            JsonScheduleProvider::new(settings.provider.schedule_dir.clone()),
            TemporalCache::from_settings(&settings.cache),
        )
        .with_policy(settings.analyzer.clone())
        .with_fetch_timeout(settings.provider.fetch_timeout())
        .with_previous_season_fallback(settings.provider.previous_season_fallback)
    }
}

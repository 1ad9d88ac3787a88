//! Single-record snapshot cache.
//!
//! There is exactly one entry: the latest [`CacheRecord`]. A refresh replaces
//! it wholesale. Read failures (missing, unreadable, unparseable) are
//! treated as a miss and never reach the caller. Write failures are logged
//! and the freshly computed record is still handed back.
//!
//! The record is a JSON document:
//!
//! ```json
//! { "cached_at": "...", "ttl_seconds": 1800, "expires_at": "...", "snapshot": { ... } }
//! ```
//!
//! `expires_at` is informational. Validity is always recomputed from
//! `cached_at + ttl_seconds`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::settings::{CacheSettings, TtlPolicy};
use crate::snapshot::TemporalSnapshot;
use crate::ttl::compute_ttl;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub cached_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub expires_at: DateTime<Utc>,
    pub snapshot: TemporalSnapshot,
}

impl CacheRecord {
    pub fn new(snapshot: TemporalSnapshot, cached_at: DateTime<Utc>, ttl_seconds: u64) -> Self {
        Self {
            cached_at,
            ttl_seconds,
            expires_at: expiry(cached_at, ttl_seconds).unwrap_or(DateTime::<Utc>::MAX_UTC),
            snapshot,
        }
    }

    /// `now < cached_at + ttl_seconds`. One gate; a record is never partially valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        expiry(self.cached_at, self.ttl_seconds).is_none_or(|expires| now < expires)
    }

    /// Time left before expiry, or `None` once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        let expires = expiry(self.cached_at, self.ttl_seconds)?;
        (now < expires).then(|| expires - now)
    }

    /// Time since the record was written. Negative if `now` precedes `cached_at`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.cached_at
    }
}

fn expiry(cached_at: DateTime<Utc>, ttl_seconds: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(ttl_seconds).ok()?;
    cached_at.checked_add_signed(TimeDelta::try_seconds(secs)?)
}

enum Store {
    File(PathBuf),
    Memory(Option<String>),
}

/// Owner of the persisted record.
///
/// Construct one per process and hand it to the
/// [`TemporalContextManager`](crate::context::TemporalContextManager). The
/// internal mutex only serializes record I/O; concurrent refreshes are
/// last-write-wins.
pub struct TemporalCache {
    store: Mutex<Store>,
    ttl_policy: TtlPolicy,
}

impl TemporalCache {
    /// File-backed cache at `path`. Parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>, ttl_policy: TtlPolicy) -> Self {
        Self {
            store: Mutex::new(Store::File(path.into())),
            ttl_policy,
        }
    }

    /// Cache that lives only as long as this value. Same serialization path as the file store.
    pub fn in_memory(ttl_policy: TtlPolicy) -> Self {
        Self {
            store: Mutex::new(Store::Memory(None)),
            ttl_policy,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.path.clone(), settings.ttl.clone())
    }

    /// Backing file, or `None` for an in-memory cache.
    pub fn path(&self) -> Option<PathBuf> {
        match &*self.store.lock() {
            Store::File(path) => Some(path.clone()),
            Store::Memory(_) => None,
        }
    }

    /// The record, if one exists and is valid at `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<CacheRecord> {
        let record = self.get_stale()?;
        if record.is_valid_at(now) {
            debug!(cached_at = %record.cached_at, ttl_seconds = record.ttl_seconds, "cache hit");
            Some(record)
        } else {
            debug!(expires_at = %record.expires_at, "cache record expired");
            None
        }
    }

    /// The record regardless of expiry. Used as the fallback when the provider fails.
    pub fn get_stale(&self) -> Option<CacheRecord> {
        let store = self.store.lock();
        match read_record(&store) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!("cache empty");
                None
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable cache record");
                None
            }
        }
    }

    /// Store `snapshot` with a TTL derived from its nearest session.
    ///
    /// Always returns the new record, even when persisting it failed.
    pub fn put(&self, snapshot: TemporalSnapshot, now: DateTime<Utc>) -> CacheRecord {
        let ttl_seconds = compute_ttl(&snapshot, &self.ttl_policy);
        let record = CacheRecord::new(snapshot, now, ttl_seconds);

        let mut store = self.store.lock();
        match write_record(&mut store, &record) {
            Ok(()) => debug!(ttl_seconds, expires_at = %record.expires_at, "cache record written"),
            Err(err) => warn!(error = %err, "cache write failed, serving uncached snapshot"),
        }
        record
    }

    /// Drop the record. Returns whether there was one.
    pub fn invalidate(&self) -> Result<bool> {
        let mut store = self.store.lock();
        match &mut *store {
            Store::Memory(slot) => Ok(slot.take().is_some()),
            Store::File(path) => match fs::remove_file(&*path) {
                Ok(()) => {
                    debug!(path = %path.display(), "cache record removed");
                    Ok(true)
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(EngineError::CacheWriteFailed(format!(
                    "{}: {e}",
                    path.display()
                ))),
            },
        }
    }
}

fn read_record(store: &Store) -> Result<Option<CacheRecord>> {
    let raw = match store {
        Store::Memory(slot) => slot.clone(),
        Store::File(path) => match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(EngineError::CacheCorrupt(format!("{}: {e}", path.display())));
            }
        },
    };

    raw.map(|content| {
        serde_json::from_str(&content).map_err(|e| EngineError::CacheCorrupt(e.to_string()))
    })
    .transpose()
}

fn write_record(store: &mut Store, record: &CacheRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| EngineError::CacheWriteFailed(e.to_string()))?;

    match store {
        Store::Memory(slot) => {
            *slot = Some(json);
            Ok(())
        }
        Store::File(path) => write_atomic(path, &json)
            .map_err(|e| EngineError::CacheWriteFailed(format!("{}: {e}", path.display()))),
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

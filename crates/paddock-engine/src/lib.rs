//! # paddock-engine
//!
//! Calendar-position oracle for motorsport seasons.
//!
//! Given a season schedule and a caller-supplied "now", the engine answers
//! where we are at three granularities (season, event weekend, session),
//! caches that answer with a TTL that shrinks as the next session
//! approaches, and renders it for LLM prompts, terminals or JSON consumers.
//!
//! ## Modules
//!
//! - [`schedule`] — Input model, [`ScheduleProvider`] trait, JSON and in-memory providers
//! - [`analyzer`] — Pure `(now, schedule) → TemporalSnapshot` classification
//! - [`snapshot`] — Snapshot value types (season/weekend phases, session state)
//! - [`ttl`] — Adaptive time-to-live from nearest-session proximity
//! - [`cache`] — Single-record snapshot cache (file or in-memory)
//! - [`context`] — Orchestration: cache → provider → analyzer → cache
//! - [`formatter`] — Prompt text at three verbosity levels, CLI report, structured JSON
//! - [`settings`] — Layered settings (defaults, JSON file, `PADDOCK_*` env)
//! - [`error`] — Error types

pub mod analyzer;
pub mod cache;
pub mod context;
pub mod error;
pub mod formatter;
pub mod schedule;
pub mod settings;
pub mod snapshot;
pub mod ttl;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::{analyze, validate_schedule};
pub use cache::{CacheRecord, TemporalCache};
pub use context::{ContextSource, ResolvedContext, TemporalContextManager};
pub use error::{EngineError, ProviderError, Result, SettingsError};
pub use formatter::{format_prompt, format_report, to_structured, Verbosity};
pub use schedule::{
    CancelToken, FetchRequest, JsonScheduleProvider, ScheduleProvider, ScheduledEvent, ScheduledSession,
    SeasonSchedule, SessionType, StaticScheduleProvider,
};
pub use settings::{load_settings, load_settings_from_path, AnalyzerPolicy, Settings, TtlPolicy};
pub use snapshot::{
    EventWeekendSnapshot, SeasonPhase, SessionSnapshot, TemporalSnapshot, WeekendPhase,
};
pub use ttl::compute_ttl;

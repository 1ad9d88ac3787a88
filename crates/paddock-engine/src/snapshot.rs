//! Snapshot types produced by the analyzer.
//!
//! A [`TemporalSnapshot`] is immutable once built. It is replaced wholesale
//! on refresh, never patched. Every type here serializes losslessly to JSON.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::SessionType;

/// Where "now" sits relative to the season calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonPhase {
    PreSeason,
    InSeason,
    PostSeason,
    OffSeason,
}

impl SeasonPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreSeason => "pre_season",
            Self::InSeason => "in_season",
            Self::PostSeason => "post_season",
            Self::OffSeason => "off_season",
        }
    }

    /// Title-cased label, e.g. "In Season".
    pub fn label(self) -> &'static str {
        match self {
            Self::PreSeason => "Pre Season",
            Self::InSeason => "In Season",
            Self::PostSeason => "Post Season",
            Self::OffSeason => "Off Season",
        }
    }
}

impl fmt::Display for SeasonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where "now" sits within one event weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekendPhase {
    BeforeWeekend,
    Practice,
    Qualifying,
    Sprint,
    Race,
    Testing,
    PostRace,
}

impl WeekendPhase {
    pub fn for_session(session_type: SessionType) -> Self {
        match session_type {
            SessionType::Practice1 | SessionType::Practice2 | SessionType::Practice3 => {
                Self::Practice
            }
            SessionType::Qualifying => Self::Qualifying,
            SessionType::SprintQualifying | SessionType::Sprint => Self::Sprint,
            SessionType::Race => Self::Race,
            SessionType::Testing => Self::Testing,
            // Unclassified sessions (parades, demos) don't move the weekend forward.
            SessionType::Unknown => Self::BeforeWeekend,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeWeekend => "before_weekend",
            Self::Practice => "practice",
            Self::Qualifying => "qualifying",
            Self::Sprint => "sprint",
            Self::Race => "race",
            Self::Testing => "testing",
            Self::PostRace => "post_race",
        }
    }
}

impl fmt::Display for WeekendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One session with its state relative to the snapshot's `generated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub name: String,
    pub session_type: SessionType,
    pub start_utc: DateTime<Utc>,
    pub start_local: NaiveDateTime,
    /// Published or estimated end.
    pub end_utc: DateTime<Utc>,
    pub is_live: bool,
    pub is_recent: bool,
    /// Whole minutes until start; `None` once the session has started.
    pub minutes_until: Option<i64>,
    /// Whole minutes since start; `None` while the session is in the future.
    pub minutes_since: Option<i64>,
}

impl SessionSnapshot {
    pub fn is_upcoming(&self) -> bool {
        self.minutes_until.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWeekendSnapshot {
    pub round: u32,
    pub event_name: String,
    pub country: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub phase: WeekendPhase,
    pub sessions: Vec<SessionSnapshot>,
    pub is_sprint_weekend: bool,
    /// Live session, or failing that the most recent one.
    pub current_session: Option<SessionSnapshot>,
    pub next_session: Option<SessionSnapshot>,
}

impl EventWeekendSnapshot {
    pub fn live_session(&self) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| s.is_live)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalSnapshot {
    pub generated_at: DateTime<Utc>,
    pub current_season: i32,
    pub season_phase: SeasonPhase,
    pub current_weekend: Option<EventWeekendSnapshot>,
    pub last_completed_weekend: Option<EventWeekendSnapshot>,
    pub next_weekend: Option<EventWeekendSnapshot>,
    pub events_completed: u32,
    pub events_remaining: u32,
    pub days_until_next_event: Option<i64>,
}

impl TemporalSnapshot {
    /// Snapshot for a season with nothing scheduled.
    pub fn empty(generated_at: DateTime<Utc>, current_season: i32) -> Self {
        Self {
            generated_at,
            current_season,
            season_phase: SeasonPhase::OffSeason,
            current_weekend: None,
            last_completed_weekend: None,
            next_weekend: None,
            events_completed: 0,
            events_remaining: 0,
            days_until_next_event: None,
        }
    }

    pub fn total_events(&self) -> u32 {
        self.events_completed + self.events_remaining
    }

    pub fn live_session(&self) -> Option<&SessionSnapshot> {
        self.current_weekend.as_ref().and_then(|w| w.live_session())
    }
}

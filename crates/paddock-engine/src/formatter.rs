//! Rendering of snapshots for prompts, terminals and machines.
//!
//! Every function here is pure: the same snapshot and verbosity always give
//! byte-identical output. Prompt text is built from lines tagged with the
//! lowest [`Verbosity`] that shows them, so a higher level only ever adds
//! lines to a lower one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheRecord;
use crate::error::EngineError;
use crate::snapshot::{EventWeekendSnapshot, SeasonPhase, SessionSnapshot, TemporalSnapshot};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Minimal,
    #[default]
    Normal,
    Detailed,
}

impl Verbosity {
    pub const ALL: [Verbosity; 3] = [Self::Minimal, Self::Normal, Self::Detailed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Normal => "normal",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "normal" => Ok(Self::Normal),
            "detailed" => Ok(Self::Detailed),
            _ => Err(EngineError::InvalidVerbosity(s.to_string())),
        }
    }
}

// ── Structured ──────────────────────────────────────────────────────────────

/// Lossless JSON form of the snapshot.
pub fn to_structured(snapshot: &TemporalSnapshot) -> serde_json::Result<Value> {
    serde_json::to_value(snapshot)
}

// ── Prompt text ─────────────────────────────────────────────────────────────

struct Lines {
    verbosity: Verbosity,
    lines: Vec<String>,
}

impl Lines {
    fn push(&mut self, min: Verbosity, line: impl Into<String>) {
        if self.verbosity >= min {
            self.lines.push(line.into());
        }
    }
}

/// Markdown-flavored context block for an LLM system prompt.
pub fn format_prompt(snapshot: &TemporalSnapshot, verbosity: Verbosity) -> String {
    use Verbosity::{Detailed, Minimal, Normal};

    let mut out = Lines {
        verbosity,
        lines: Vec::new(),
    };

    out.push(Minimal, "## Motorsport Temporal Context");
    out.push(Minimal, "");
    out.push(
        Minimal,
        format!(
            "**Season:** {} ({})",
            snapshot.current_season,
            snapshot.season_phase.label()
        ),
    );
    out.push(
        Detailed,
        format!("**As Of:** {}", snapshot.generated_at.format("%Y-%m-%d %H:%M UTC")),
    );
    if snapshot.season_phase != SeasonPhase::OffSeason || snapshot.total_events() > 0 {
        out.push(
            Normal,
            format!(
                "**Progress:** {} of {} events completed, {} remaining",
                snapshot.events_completed,
                snapshot.total_events(),
                snapshot.events_remaining
            ),
        );
    }

    if let Some(weekend) = &snapshot.current_weekend {
        out.push(Normal, "");
        out.push(
            Normal,
            format!(
                "**ACTIVE WEEKEND:** {} (Round {})",
                weekend.event_name, weekend.round
            ),
        );
        out.push(Normal, format!("- Location: {}", location(weekend)));
        out.push(Normal, format!("- Format: {}", weekend_format(weekend)));
        out.push(Normal, format!("- Phase: {}", weekend.phase));

        if let Some(session) = &weekend.current_session {
            let label = if session.is_live { "Live Session" } else { "Recent Session" };
            let mut line = format!("**{label}:** {}", session.name);
            if let Some(since) = session.minutes_since {
                line.push_str(&format!(" (started {} ago)", describe_minutes(since)));
            }
            out.push(Normal, line);
        }
        if let Some(session) = &weekend.next_session {
            out.push(
                Normal,
                format!(
                    "**Next Session:** {} - {}",
                    session.name,
                    session.start_local.format("%A, %B %d at %H:%M local")
                ),
            );
            if let Some(until) = session.minutes_until {
                out.push(Normal, format!("- Starts in {}", describe_minutes(until)));
            }
        }

        out.push(Detailed, "**Weekend Sessions:**");
        for session in &weekend.sessions {
            out.push(Detailed, session_line(session));
        }
    }

    out.push(Minimal, "");
    match &snapshot.next_weekend {
        Some(next) => {
            out.push(
                Minimal,
                format!(
                    "**Next Event:** {} (Round {}) - {}",
                    next.event_name,
                    next.round,
                    long_date(next.event_date)
                ),
            );
            if let Some(days) = snapshot.days_until_next_event {
                out.push(Normal, format!("- {}", days_until_phrase(days)));
            }
            let is_current = snapshot
                .current_weekend
                .as_ref()
                .is_some_and(|w| w.round == next.round);
            if !is_current {
                out.push(Normal, format!("- Location: {}", location(next)));
                out.push(Normal, format!("- Format: {}", weekend_format(next)));
                out.push(Detailed, "- Sessions:");
                for session in &next.sessions {
                    out.push(Detailed, format!("  {}", session_line(session)));
                }
            }
        }
        None => out.push(Minimal, "**Next Event:** none scheduled"),
    }

    if let Some(last) = &snapshot.last_completed_weekend {
        out.push(Normal, "");
        out.push(
            Normal,
            format!(
                "**Last Event:** {} (Round {}) - {}",
                last.event_name,
                last.round,
                long_date(last.event_date)
            ),
        );
        out.push(Normal, format!("- Location: {}", location(last)));
        let days_since = (snapshot.generated_at - last.event_date).num_days().max(0);
        out.push(Detailed, format!("- {} ago", plural(days_since, "day")));
    }

    out.lines.join("\n")
}

fn session_line(session: &SessionSnapshot) -> String {
    let status = if session.is_live {
        "LIVE".to_string()
    } else if let Some(until) = session.minutes_until {
        format!("in {}", describe_minutes(until))
    } else if session.is_recent {
        "just finished".to_string()
    } else {
        "completed".to_string()
    };
    format!(
        "- [{}] {}: {} ({} local) - {}",
        session.session_type,
        session.name,
        session.start_utc.format("%a %d %b %H:%M UTC"),
        session.start_local.format("%H:%M"),
        status
    )
}

// ── CLI report ──────────────────────────────────────────────────────────────

/// Long plain-text report for terminals. Includes cache details when `record` is given.
pub fn format_report(snapshot: &TemporalSnapshot, record: Option<&CacheRecord>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        heavy.clone(),
        "MOTORSPORT TEMPORAL CONTEXT".to_string(),
        heavy.clone(),
        String::new(),
        format!(
            "Current Time (UTC): {}",
            snapshot.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("Season: {}", snapshot.current_season),
        format!("Phase: {}", snapshot.season_phase.label()),
        format!("Events Completed: {}", snapshot.events_completed),
        format!("Events Remaining: {}", snapshot.events_remaining),
        String::new(),
    ];

    if let Some(weekend) = &snapshot.current_weekend {
        section(&mut lines, "CURRENT WEEKEND");
        event_block(&mut lines, weekend);
        lines.push(format!("Format: {}", weekend_format(weekend)));
        lines.push(format!("Weekend Phase: {}", weekend.phase));
        if let Some(session) = &weekend.current_session {
            let status = if session.is_live { "LIVE" } else { "Recent" };
            lines.push(format!("Current Session ({status}): {}", session.name));
        }
        if let Some(session) = &weekend.next_session {
            lines.push(format!("Next Session: {}", session.name));
            lines.push(format!(
                "  Scheduled: {}",
                session.start_local.format("%A, %B %d at %H:%M local")
            ));
        }
        lines.push(String::new());
    }

    if let Some(next) = &snapshot.next_weekend {
        section(&mut lines, "NEXT EVENT");
        event_block(&mut lines, next);
        if let Some(days) = snapshot.days_until_next_event {
            lines.push(format!("Days Until Event: {days}"));
        }
        lines.push(String::new());
    }

    if let Some(last) = &snapshot.last_completed_weekend {
        section(&mut lines, "LAST COMPLETED EVENT");
        event_block(&mut lines, last);
        let days_since = (snapshot.generated_at - last.event_date).num_days().max(0);
        lines.push(format!("Days Since: {days_since}"));
        lines.push(String::new());
    }

    if let Some(record) = record {
        section(&mut lines, "CACHE INFO");
        lines.push(format!(
            "Cached At: {}",
            record.cached_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!(
            "TTL: {} seconds ({})",
            record.ttl_seconds,
            describe_minutes((record.ttl_seconds / 60) as i64)
        ));
        lines.push(format!(
            "Expires At: {}",
            record.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    lines.push(heavy);
    lines.join("\n")
}

fn section(lines: &mut Vec<String>, title: &str) {
    let light = "-".repeat(RULE_WIDTH);
    lines.push(light.clone());
    lines.push(title.to_string());
    lines.push(light);
}

fn event_block(lines: &mut Vec<String>, weekend: &EventWeekendSnapshot) {
    lines.push(format!("Event: {}", weekend.event_name));
    lines.push(format!("Round: {}", weekend.round));
    lines.push(format!("Location: {}", location(weekend)));
    lines.push(format!("Date: {}", long_date(weekend.event_date)));
}

// ── Phrasing helpers ────────────────────────────────────────────────────────

fn location(weekend: &EventWeekendSnapshot) -> String {
    match (weekend.location.is_empty(), weekend.country.is_empty()) {
        (false, false) => format!("{}, {}", weekend.location, weekend.country),
        (false, true) => weekend.location.clone(),
        (true, false) => weekend.country.clone(),
        (true, true) => "unknown".to_string(),
    }
}

fn weekend_format(weekend: &EventWeekendSnapshot) -> &'static str {
    if weekend.is_sprint_weekend {
        "Sprint weekend"
    } else {
        "Conventional weekend"
    }
}

fn long_date(dt: DateTime<Utc>) -> String {
    dt.format("%B %d, %Y").to_string()
}

fn days_until_phrase(days: i64) -> String {
    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        n => format!("{n} days away"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{n} {unit}{}", if n == 1 { "" } else { "s" })
}

/// "2 days, 3 hours, 5 minutes". Zero renders as "0 minutes".
pub fn describe_minutes(total: i64) -> String {
    let total = total.max(0);
    let days = total / (24 * 60);
    let hours = (total % (24 * 60)) / 60;
    let minutes = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(plural(minutes, "minute"));
    }
    parts.join(", ")
}

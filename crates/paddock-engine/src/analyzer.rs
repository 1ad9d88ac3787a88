//! Calendar-position analysis.
//!
//! [`analyze`] is a pure function of `(now, schedule, policy)`: no clock
//! access, no I/O, no shared state. The caller supplies "now", which keeps
//! every classification reproducible in tests and safe to run from any
//! number of threads.
//!
//! # Classification rules
//!
//! - A session is live on `[start, end]` (both inclusive). When its end
//!   reaches the next session's start, the interval becomes
//!   `[start, next_start)` so adjacent sessions never overlap.
//! - An event is current while `now` is inside
//!   `[first_start − pre_weekend_buffer, last_end + post_weekend_buffer]`.
//! - "Last completed" is the highest round whose last session has ended and
//!   which is not current; "next" is the lowest round whose first session
//!   has not started.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::{EngineError, Result};
use crate::schedule::{ScheduledEvent, SeasonSchedule, SessionType};
use crate::settings::AnalyzerPolicy;
use crate::snapshot::{
    EventWeekendSnapshot, SeasonPhase, SessionSnapshot, TemporalSnapshot, WeekendPhase,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Compute the temporal snapshot for `now`.
///
/// An empty schedule yields an `off_season` snapshot with every weekend
/// field empty.
///
/// # Errors
///
/// Returns [`EngineError::InvalidSchedule`] when event windows overlap or
/// are out of round order, rounds repeat, a session ends before it starts,
/// an event timezone is not a valid IANA name, or a session or window bound
/// falls outside the representable date range. The analyzer never guesses
/// which of two overlapping events is current.
pub fn analyze(
    now: DateTime<Utc>,
    schedule: &SeasonSchedule,
    policy: &AnalyzerPolicy,
) -> Result<TemporalSnapshot> {
    if schedule.events.is_empty() {
        return Ok(TemporalSnapshot::empty(now, schedule.season));
    }

    let events = plan_events(schedule, policy)?;

    let season_phase = season_phase(now, &events, policy)?;

    let current = events
        .iter()
        .position(|e| e.window_start <= now && now <= e.window_end);

    let last_completed = events
        .iter()
        .enumerate()
        .rev()
        .find(|(i, e)| e.last_end < now && Some(*i) != current)
        .map(|(i, _)| i);

    let next = events.iter().position(|e| e.first_start > now);

    let events_completed = events.iter().filter(|e| e.last_end < now).count() as u32;
    let events_remaining = events.len() as u32 - events_completed;

    let days_until_next_event = next.map(|i| whole_days_until(now, events[i].event.event_date));

    Ok(TemporalSnapshot {
        generated_at: now,
        current_season: schedule.season,
        season_phase,
        current_weekend: current.map(|i| build_weekend(&events[i], now, policy, false)),
        last_completed_weekend: last_completed.map(|i| build_weekend(&events[i], now, policy, true)),
        next_weekend: next.map(|i| build_weekend(&events[i], now, policy, false)),
        events_completed,
        events_remaining,
        days_until_next_event,
    })
}

/// Check the schedule against the analyzer's invariants without computing a snapshot.
pub fn validate_schedule(schedule: &SeasonSchedule, policy: &AnalyzerPolicy) -> Result<()> {
    plan_events(schedule, policy).map(|_| ())
}

// ── Planning ────────────────────────────────────────────────────────────────

struct PlannedSession<'a> {
    name: &'a str,
    session_type: SessionType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    local: NaiveDateTime,
}

struct PlannedEvent<'a> {
    event: &'a ScheduledEvent,
    sessions: Vec<PlannedSession<'a>>,
    first_start: DateTime<Utc>,
    last_end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

/// Resolve session types, ends and local times; sort by round and start; validate.
fn plan_events<'a>(
    schedule: &'a SeasonSchedule,
    policy: &AnalyzerPolicy,
) -> Result<Vec<PlannedEvent<'a>>> {
    let mut planned = Vec::with_capacity(schedule.events.len());

    for event in &schedule.events {
        let mut sessions = Vec::with_capacity(event.sessions.len());
        for session in &event.sessions {
            let session_type = session.resolved_type();
            let end = match session.end_utc {
                Some(end) => end,
                None => shift(
                    session.start_utc,
                    policy.session_durations.for_type(session_type),
                    || format!("round {} session '{}' end", event.round, session.name),
                )?,
            };
            if end < session.start_utc {
                return Err(EngineError::InvalidSchedule(format!(
                    "round {} session '{}' ends before it starts",
                    event.round, session.name
                )));
            }
            sessions.push(PlannedSession {
                name: &session.name,
                session_type,
                start: session.start_utc,
                end,
                local: event.local_start(session)?,
            });
        }
        sessions.sort_by_key(|s| s.start);

        let first_start = sessions.first().map_or(event.event_date, |s| s.start);
        let last_end = sessions
            .iter()
            .map(|s| s.end)
            .max()
            .unwrap_or(event.event_date);

        let window_start = shift(first_start, -policy.pre_weekend_buffer(), || {
            format!("round {} weekend window start", event.round)
        })?;
        let window_end = shift(last_end, policy.post_weekend_buffer(), || {
            format!("round {} weekend window end", event.round)
        })?;

        planned.push(PlannedEvent {
            event,
            sessions,
            first_start,
            last_end,
            window_start,
            window_end,
        });
    }

    planned.sort_by_key(|e| e.event.round);

    for pair in planned.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.event.round == b.event.round {
            return Err(EngineError::InvalidSchedule(format!(
                "round {} appears more than once",
                a.event.round
            )));
        }
        if b.window_start <= a.window_end {
            return Err(EngineError::InvalidSchedule(format!(
                "weekend window of round {} ({}) overlaps or precedes round {} (ends {})",
                b.event.round,
                b.window_start.to_rfc3339(),
                a.event.round,
                a.window_end.to_rfc3339()
            )));
        }
    }

    Ok(planned)
}

// ── Season phase ────────────────────────────────────────────────────────────

fn season_phase(
    now: DateTime<Utc>,
    events: &[PlannedEvent<'_>],
    policy: &AnalyzerPolicy,
) -> Result<SeasonPhase> {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Ok(SeasonPhase::OffSeason);
    };

    let season_start = shift(first.window_start, -policy.pre_season_margin(), || {
        "pre-season margin before round 1".to_string()
    })?;
    let post_season = shift(last.window_end, policy.post_season_margin(), || {
        "post-season margin after the final round".to_string()
    })?;
    let off_season = shift(last.window_end, policy.off_season_after(), || {
        "off-season start after the final round".to_string()
    })?;

    Ok(if now < season_start {
        SeasonPhase::PreSeason
    } else if now > off_season {
        SeasonPhase::OffSeason
    } else if now > post_season {
        SeasonPhase::PostSeason
    } else {
        SeasonPhase::InSeason
    })
}

/// `at + delta`, or `InvalidSchedule` naming `what` when the result is out of range.
fn shift(
    at: DateTime<Utc>,
    delta: TimeDelta,
    what: impl FnOnce() -> String,
) -> Result<DateTime<Utc>> {
    at.checked_add_signed(delta).ok_or_else(|| {
        EngineError::InvalidSchedule(format!("{} is outside the supported date range", what()))
    })
}

// ── Weekend / session classification ───────────────────────────────────────

fn build_weekend(
    planned: &PlannedEvent<'_>,
    now: DateTime<Utc>,
    policy: &AnalyzerPolicy,
    completed: bool,
) -> EventWeekendSnapshot {
    let sessions: Vec<SessionSnapshot> = planned
        .sessions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let next_start = planned.sessions.get(i + 1).map(|n| n.start);
            classify_session(s, next_start, now, policy.recent_window())
        })
        .collect();

    let live = sessions.iter().find(|s| s.is_live);
    let current_session = live
        .or_else(|| sessions.iter().rev().find(|s| s.is_recent))
        .cloned();
    let next_session = sessions.iter().find(|s| s.is_upcoming()).cloned();

    let phase = if completed {
        WeekendPhase::PostRace
    } else {
        weekend_phase(&sessions, now)
    };

    let format_is_sprint = planned
        .event
        .format
        .as_deref()
        .is_some_and(|f| f.to_lowercase().contains("sprint"));
    let is_sprint_weekend =
        format_is_sprint || sessions.iter().any(|s| s.session_type.is_sprint());

    EventWeekendSnapshot {
        round: planned.event.round,
        event_name: planned.event.name.clone(),
        country: planned.event.country.clone(),
        location: planned.event.location.clone(),
        event_date: planned.event.event_date,
        phase,
        sessions,
        is_sprint_weekend,
        current_session,
        next_session,
    }
}

fn classify_session(
    session: &PlannedSession<'_>,
    next_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    recent_window: TimeDelta,
) -> SessionSnapshot {
    let started = session.start <= now;
    let is_live = match next_start {
        Some(next) if next <= session.end => started && now < next,
        _ => started && now <= session.end,
    };
    let is_recent = !is_live && now > session.end && now - session.end <= recent_window;

    let (minutes_until, minutes_since) = if started {
        (None, Some((now - session.start).num_minutes()))
    } else {
        (Some((session.start - now).num_minutes()), None)
    };

    SessionSnapshot {
        name: session.name.to_string(),
        session_type: session.session_type,
        start_utc: session.start,
        start_local: session.local,
        end_utc: session.end,
        is_live,
        is_recent,
        minutes_until,
        minutes_since,
    }
}

fn weekend_phase(sessions: &[SessionSnapshot], now: DateTime<Utc>) -> WeekendPhase {
    if let Some(live) = sessions
        .iter()
        .find(|s| s.is_live && s.session_type != SessionType::Unknown)
    {
        return WeekendPhase::for_session(live.session_type);
    }
    if sessions.is_empty() || sessions.iter().all(|s| s.is_upcoming()) {
        return WeekendPhase::BeforeWeekend;
    }
    if sessions.iter().all(|s| s.end_utc < now) {
        return WeekendPhase::PostRace;
    }
    // Between sessions: the weekend is in the phase of the last session that started.
    sessions
        .iter()
        .rev()
        .filter(|s| !s.is_upcoming() && s.session_type != SessionType::Unknown)
        .map(|s| WeekendPhase::for_session(s.session_type))
        .next()
        .unwrap_or(WeekendPhase::BeforeWeekend)
}

/// Ceiling of whole days from `now` to `target`, never negative.
fn whole_days_until(now: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    let secs = (target - now).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduledSession;
    use crate::testing::{at, sample_season};
    use chrono::TimeZone;

    fn policy() -> AnalyzerPolicy {
        AnalyzerPolicy::default()
    }

    fn run(now: DateTime<Utc>) -> TemporalSnapshot {
        analyze(now, &sample_season(), &policy()).unwrap()
    }

    // ── season phase ────────────────────────────────────────────────────

    #[test]
    fn test_empty_schedule_is_off_season() {
        let snap = analyze(at(2025, 6, 1, 12, 0), &SeasonSchedule::new(2025, vec![]), &policy())
            .unwrap();
        assert_eq!(snap.season_phase, SeasonPhase::OffSeason);
        assert_eq!(snap.current_season, 2025);
        assert!(snap.current_weekend.is_none());
        assert!(snap.last_completed_weekend.is_none());
        assert!(snap.next_weekend.is_none());
        assert_eq!(snap.days_until_next_event, None);
        assert_eq!((snap.events_completed, snap.events_remaining), (0, 0));
    }

    #[test]
    fn test_pre_season_far_before_first_event() {
        let snap = run(at(2025, 1, 15, 0, 0));
        assert_eq!(snap.season_phase, SeasonPhase::PreSeason);
        assert_eq!(snap.next_weekend.as_ref().unwrap().round, 1);
        assert!(snap.last_completed_weekend.is_none());
        assert_eq!(snap.events_completed, 0);
        assert_eq!(snap.events_remaining, 3);
        // Jan 15 00:00 → Mar 9 00:00 is exactly 53 days
        assert_eq!(snap.days_until_next_event, Some(53));
    }

    #[test]
    fn test_in_season_within_pre_season_margin() {
        // Ten days before the first weekend window is inside the 14-day margin.
        let snap = run(at(2025, 2, 23, 0, 0));
        assert_eq!(snap.season_phase, SeasonPhase::InSeason);
    }

    #[test]
    fn test_post_season_then_off_season() {
        let post = run(at(2025, 4, 20, 0, 0));
        assert_eq!(post.season_phase, SeasonPhase::PostSeason);
        assert_eq!(post.last_completed_weekend.as_ref().unwrap().round, 3);
        assert!(post.next_weekend.is_none());
        assert_eq!(post.days_until_next_event, None);
        assert_eq!((post.events_completed, post.events_remaining), (3, 0));

        let off = run(at(2025, 5, 10, 0, 0));
        assert_eq!(off.season_phase, SeasonPhase::OffSeason);
    }

    // ── event classification ────────────────────────────────────────────

    #[test]
    fn test_between_weekends() {
        let snap = run(at(2025, 3, 14, 12, 0));
        assert_eq!(snap.season_phase, SeasonPhase::InSeason);
        assert!(snap.current_weekend.is_none());

        let last = snap.last_completed_weekend.as_ref().unwrap();
        assert_eq!(last.round, 1);
        assert_eq!(last.phase, WeekendPhase::PostRace);
        assert_eq!(snap.next_weekend.as_ref().unwrap().round, 2);
        assert_eq!((snap.events_completed, snap.events_remaining), (1, 2));
        // 8.5 days rounds up
        assert_eq!(snap.days_until_next_event, Some(9));
    }

    #[test]
    fn test_weekend_current_before_first_session() {
        let snap = run(at(2025, 3, 6, 12, 0));
        let current = snap.current_weekend.as_ref().unwrap();
        assert_eq!(current.round, 1);
        assert_eq!(current.phase, WeekendPhase::BeforeWeekend);
        assert!(current.current_session.is_none());

        let next_session = current.next_session.as_ref().unwrap();
        assert_eq!(next_session.session_type, SessionType::Practice1);
        assert_eq!(next_session.minutes_until, Some(23 * 60 + 30));
        // First session hasn't started, so this event is also "next".
        assert_eq!(snap.next_weekend.as_ref().unwrap().round, 1);
    }

    #[test]
    fn test_race_start_exactly_is_live() {
        let snap = run(at(2025, 3, 9, 15, 0));
        let current = snap.current_weekend.as_ref().unwrap();
        assert_eq!(current.phase, WeekendPhase::Race);

        let race = current.current_session.as_ref().unwrap();
        assert_eq!(race.session_type, SessionType::Race);
        assert!(race.is_live);
        assert_eq!(race.minutes_until, None);
        assert_eq!(race.minutes_since, Some(0));
        assert_eq!(snap.next_weekend.as_ref().unwrap().round, 2);
    }

    #[test]
    fn test_estimated_end_is_inclusive() {
        // Race estimate is 150 minutes: 15:00 → 17:30.
        let at_end = run(at(2025, 3, 9, 17, 30));
        assert!(at_end.live_session().is_some());

        let after = run(at(2025, 3, 9, 17, 31));
        let weekend = after.current_weekend.as_ref().unwrap();
        assert!(weekend.live_session().is_none());
        assert_eq!(weekend.phase, WeekendPhase::PostRace);
        let recent = weekend.current_session.as_ref().unwrap();
        assert_eq!(recent.session_type, SessionType::Race);
        assert!(recent.is_recent);
    }

    #[test]
    fn test_between_sessions_keeps_last_phase() {
        // FP1 11:30–13:00, FP2 at 15:00
        let snap = run(at(2025, 3, 7, 14, 0));
        let weekend = snap.current_weekend.as_ref().unwrap();
        assert_eq!(weekend.phase, WeekendPhase::Practice);
        assert!(weekend.live_session().is_none());

        let recent = weekend.current_session.as_ref().unwrap();
        assert_eq!(recent.session_type, SessionType::Practice1);
        assert!(recent.is_recent);
        assert_eq!(recent.minutes_since, Some(150));

        let next = weekend.next_session.as_ref().unwrap();
        assert_eq!(next.session_type, SessionType::Practice2);
        assert_eq!(next.minutes_until, Some(60));
    }

    #[test]
    fn test_ten_minutes_before_qualifying() {
        let snap = run(at(2025, 3, 8, 15, 50));
        let weekend = snap.current_weekend.as_ref().unwrap();
        let next = weekend.next_session.as_ref().unwrap();
        assert_eq!(next.session_type, SessionType::Qualifying);
        assert_eq!(next.minutes_until, Some(10));
    }

    #[test]
    fn test_last_completed_excludes_current_weekend() {
        // Six-hour post-weekend buffer: round 1 is still current at 21:00.
        let snap = run(at(2025, 3, 9, 21, 0));
        assert_eq!(snap.current_weekend.as_ref().unwrap().round, 1);
        assert!(snap.last_completed_weekend.is_none());
        assert_eq!(snap.events_completed, 1);
    }

    #[test]
    fn test_recent_window_is_24_hours_after_end() {
        // FP2 15:00–16:30 on Mar 7
        let inside = run(at(2025, 3, 8, 16, 30));
        let fp2 = &inside.current_weekend.as_ref().unwrap().sessions[1];
        assert!(fp2.is_recent);

        let outside = run(at(2025, 3, 8, 16, 31));
        let fp2 = &outside.current_weekend.as_ref().unwrap().sessions[1];
        assert!(!fp2.is_recent);
    }

    #[test]
    fn test_back_to_back_sessions_never_both_live() {
        let start = at(2025, 7, 4, 10, 0);
        let mut fp1 = ScheduledSession::new("Practice 1", start);
        fp1.session_type = Some(SessionType::Practice1);
        let fp2 = ScheduledSession::new("Practice 2", start + TimeDelta::minutes(60));
        let schedule = SeasonSchedule::new(
            2025,
            vec![crate::testing::event(1, "British Grand Prix", at(2025, 7, 6, 0, 0), vec![fp1, fp2])],
        );

        for minute in [0, 59, 60, 61, 89, 90, 91, 150] {
            let now = start + TimeDelta::minutes(minute);
            let snap = analyze(now, &schedule, &policy()).unwrap();
            let sessions = &snap.current_weekend.as_ref().unwrap().sessions;
            let live: Vec<_> = sessions.iter().filter(|s| s.is_live).map(|s| s.name.as_str()).collect();
            assert!(live.len() <= 1, "minute {minute}: {live:?}");
            if minute < 60 {
                assert_eq!(live, vec!["Practice 1"], "minute {minute}");
            } else {
                assert_eq!(live, vec!["Practice 2"], "minute {minute}");
            }
        }
    }

    #[test]
    fn test_explicit_end_time_overrides_estimate() {
        let start = at(2025, 7, 6, 14, 0);
        let mut race = ScheduledSession::new("Race", start);
        race.end_utc = Some(start + TimeDelta::minutes(95));
        let schedule = SeasonSchedule::new(
            2025,
            vec![crate::testing::event(1, "British Grand Prix", at(2025, 7, 6, 0, 0), vec![race])],
        );

        let snap = analyze(start + TimeDelta::minutes(100), &schedule, &policy()).unwrap();
        let race = &snap.current_weekend.as_ref().unwrap().sessions[0];
        assert!(!race.is_live);
        assert!(race.is_recent);
        assert_eq!(race.end_utc, start + TimeDelta::minutes(95));
    }

    #[test]
    fn test_sprint_weekend_detection() {
        let snap = run(at(2025, 3, 14, 12, 0));
        assert!(!snap.last_completed_weekend.as_ref().unwrap().is_sprint_weekend);
        assert!(snap.next_weekend.as_ref().unwrap().is_sprint_weekend);
    }

    #[test]
    fn test_sprint_phase_while_sprint_live() {
        // Sprint 03:00 on Mar 22
        let snap = run(at(2025, 3, 22, 3, 20));
        let weekend = snap.current_weekend.as_ref().unwrap();
        assert_eq!(weekend.round, 2);
        assert_eq!(weekend.phase, WeekendPhase::Sprint);
    }

    #[test]
    fn test_local_time_from_event_timezone() {
        let snap = run(at(2025, 3, 1, 0, 0));
        let fp1 = &snap.next_weekend.as_ref().unwrap().sessions[0];
        // Asia/Bahrain is UTC+3
        assert_eq!(fp1.start_local.to_string(), "2025-03-07 14:30:00");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let now = at(2025, 3, 22, 5, 0);
        let ordered = sample_season();
        let mut shuffled = ordered.clone();
        shuffled.events.reverse();
        for event in &mut shuffled.events {
            event.sessions.reverse();
        }
        assert_eq!(
            analyze(now, &ordered, &policy()).unwrap(),
            analyze(now, &shuffled, &policy()).unwrap()
        );
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let now = at(2025, 3, 21, 8, 0);
        assert_eq!(run(now), run(now));
    }

    // ── validation ──────────────────────────────────────────────────────

    #[test]
    fn test_overlapping_windows_are_invalid() {
        let mut schedule = sample_season();
        // Move round 2 to the day after round 1's race.
        let shift = at(2025, 3, 10, 3, 30) - at(2025, 3, 21, 3, 30);
        for s in &mut schedule.events[1].sessions {
            s.start_utc += shift;
        }
        let err = analyze(at(2025, 3, 9, 0, 0), &schedule, &policy()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchedule(_)), "got: {err}");
        assert!(err.to_string().contains("round 2"), "got: {err}");
    }

    #[test]
    fn test_duplicate_rounds_are_invalid() {
        let mut schedule = sample_season();
        schedule.events[2].round = 2;
        let err = validate_schedule(&schedule, &policy()).unwrap_err();
        assert!(err.to_string().contains("more than once"), "got: {err}");
    }

    #[test]
    fn test_session_ending_before_start_is_invalid() {
        let mut schedule = sample_season();
        let s = &mut schedule.events[0].sessions[0];
        s.end_utc = Some(s.start_utc - TimeDelta::minutes(1));
        assert!(matches!(
            validate_schedule(&schedule, &policy()),
            Err(EngineError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_event_without_sessions_uses_event_date() {
        let schedule = SeasonSchedule::new(
            2025,
            vec![crate::testing::event(1, "Season Launch", at(2025, 2, 18, 19, 0), vec![])],
        );
        let snap = analyze(at(2025, 2, 18, 20, 0), &schedule, &policy()).unwrap();
        let current = snap.current_weekend.as_ref().unwrap();
        assert_eq!(current.phase, WeekendPhase::BeforeWeekend);
        assert!(current.sessions.is_empty());
        assert_eq!(snap.events_completed, 1);
    }

    #[test]
    fn test_session_near_end_of_time_is_invalid() {
        let schedule = SeasonSchedule::from_json_str(
            r#"{"season": 2025, "events": [{"round": 1, "name": "Far Future Grand Prix",
                "event_date": "2025-03-09T00:00:00Z",
                "sessions": [{"name": "Race", "start_utc": "+262142-12-31T23:00:00Z"}]}]}"#,
        )
        .unwrap();
        let err = analyze(at(2025, 3, 1, 0, 0), &schedule, &policy()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchedule(_)), "got: {err}");
        assert!(err.to_string().contains("date range"), "got: {err}");
    }

    #[test]
    fn test_unvalidated_policy_margin_is_invalid_not_a_panic() {
        let huge = AnalyzerPolicy {
            pre_season_margin_days: 200_000_000,
            ..policy()
        };
        let err = analyze(at(2025, 3, 1, 0, 0), &sample_season(), &huge).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSchedule(_)), "got: {err}");

        let endless = AnalyzerPolicy {
            post_weekend_buffer_hours: i64::MAX,
            ..policy()
        };
        assert!(validate_schedule(&sample_season(), &endless).is_err());
    }

    #[test]
    fn test_whole_days_until_ceiling() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(whole_days_until(now, now), 0);
        assert_eq!(whole_days_until(now, now + TimeDelta::seconds(1)), 1);
        assert_eq!(whole_days_until(now, now + TimeDelta::days(2)), 2);
        assert_eq!(whole_days_until(now, now - TimeDelta::days(2)), 0);
    }
}

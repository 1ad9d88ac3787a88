//! Adaptive time-to-live for cached snapshots.
//!
//! The closer the nearest session, the shorter the TTL. A snapshot taken an
//! hour before qualifying must not be served for six hours, because by then
//! the "not live yet" answer is wrong.

use crate::settings::TtlPolicy;
use crate::snapshot::{EventWeekendSnapshot, SessionSnapshot, TemporalSnapshot};

/// Minutes between the snapshot's `generated_at` and the most relevant session.
///
/// `Some(0)` while a session is live. Otherwise the nearest upcoming session
/// in the current or next weekend, then the most recently started session in
/// the current or last-completed weekend. `None` when no session is known.
pub fn nearest_session_proximity(snapshot: &TemporalSnapshot) -> Option<i64> {
    if snapshot.live_session().is_some() {
        return Some(0);
    }

    let upcoming = [&snapshot.current_weekend, &snapshot.next_weekend];
    if let Some(until) = sessions_of(&upcoming)
        .filter_map(|s| s.minutes_until)
        .min()
    {
        return Some(until.max(0));
    }

    let past = [&snapshot.current_weekend, &snapshot.last_completed_weekend];
    sessions_of(&past)
        .filter_map(|s| s.minutes_since)
        .min()
        .map(|since| since.max(0))
}

/// TTL in seconds for `snapshot` under `policy`.
pub fn compute_ttl(snapshot: &TemporalSnapshot, policy: &TtlPolicy) -> u64 {
    match nearest_session_proximity(snapshot) {
        Some(minutes) => ttl_for_proximity(minutes, policy),
        None => policy.fallback_seconds,
    }
}

/// First tier whose bound exceeds `minutes`, else the fallback.
pub fn ttl_for_proximity(minutes: i64, policy: &TtlPolicy) -> u64 {
    policy
        .tiers
        .iter()
        .find(|tier| minutes < tier.below_minutes)
        .map_or(policy.fallback_seconds, |tier| tier.ttl_seconds)
}

fn sessions_of<'a>(
    weekends: &'a [&'a Option<EventWeekendSnapshot>],
) -> impl Iterator<Item = &'a SessionSnapshot> + 'a {
    weekends
        .iter()
        .filter_map(|w| w.as_ref())
        .flat_map(|w| w.sessions.iter())
}

//! Shared fixtures for unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::schedule::{ScheduledEvent, ScheduledSession, SeasonSchedule};

pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub(crate) fn event(
    round: u32,
    name: &str,
    event_date: DateTime<Utc>,
    sessions: Vec<ScheduledSession>,
) -> ScheduledEvent {
    ScheduledEvent {
        round,
        name: name.to_string(),
        country: String::new(),
        location: String::new(),
        event_date,
        format: None,
        timezone: None,
        sessions,
    }
}

fn sessions(list: &[(&str, DateTime<Utc>)]) -> Vec<ScheduledSession> {
    list.iter()
        .map(|(name, start)| ScheduledSession::new(*name, *start))
        .collect()
}

/// Three-round season: a conventional weekend, a sprint weekend, another conventional one.
pub(crate) fn sample_season() -> SeasonSchedule {
    let mut bahrain = event(
        1,
        "Bahrain Grand Prix",
        at(2025, 3, 9, 0, 0),
        sessions(&[
            ("Practice 1", at(2025, 3, 7, 11, 30)),
            ("Practice 2", at(2025, 3, 7, 15, 0)),
            ("Practice 3", at(2025, 3, 8, 12, 30)),
            ("Qualifying", at(2025, 3, 8, 16, 0)),
            ("Race", at(2025, 3, 9, 15, 0)),
        ]),
    );
    bahrain.country = "Bahrain".to_string();
    bahrain.location = "Sakhir".to_string();
    bahrain.format = Some("conventional".to_string());
    bahrain.timezone = Some("Asia/Bahrain".to_string());

    let mut china = event(
        2,
        "Chinese Grand Prix",
        at(2025, 3, 23, 0, 0),
        sessions(&[
            ("Practice 1", at(2025, 3, 21, 3, 30)),
            ("Sprint Qualifying", at(2025, 3, 21, 7, 30)),
            ("Sprint", at(2025, 3, 22, 3, 0)),
            ("Qualifying", at(2025, 3, 22, 7, 0)),
            ("Race", at(2025, 3, 23, 7, 0)),
        ]),
    );
    china.country = "China".to_string();
    china.location = "Shanghai".to_string();
    china.format = Some("sprint_qualifying".to_string());
    china.timezone = Some("Asia/Shanghai".to_string());

    let mut japan = event(
        3,
        "Japanese Grand Prix",
        at(2025, 4, 6, 0, 0),
        sessions(&[
            ("Practice 1", at(2025, 4, 4, 2, 30)),
            ("Practice 2", at(2025, 4, 4, 6, 0)),
            ("Practice 3", at(2025, 4, 5, 2, 30)),
            ("Qualifying", at(2025, 4, 5, 6, 0)),
            ("Race", at(2025, 4, 6, 5, 0)),
        ]),
    );
    japan.country = "Japan".to_string();
    japan.location = "Suzuka".to_string();
    japan.format = Some("conventional".to_string());
    japan.timezone = Some("Asia/Tokyo".to_string());

    SeasonSchedule::new(2025, vec![bahrain, china, japan])
}

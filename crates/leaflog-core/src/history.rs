//! Status history over a date range.
//!
//! A history is a list of `(at, status)` transitions. The first entry is the
//! anchor: the status in force at `from`, stamped `from`. Every later entry is
//! an event in `(from, to]` that actually changed the status; repeats of the
//! current status are collapsed. Replaying a history therefore answers
//! [`crate::status::status_at`] for any instant in `[from, to]`.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::error::{ErrorCode, LeafError, Result};
use crate::event::Event;
use crate::model::status::PlantStatus;
use crate::records::ensure_plant_exists;
use crate::status::{latest_status_through, status_from_log};
use crate::time::{from_us, parse_instant, to_us};

/// One entry of a status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTransition {
    pub at: DateTime<Utc>,
    pub status: PlantStatus,
}

/// Status transitions of `plant_id` between `from` and `to`, inclusive.
///
/// # Errors
///
/// - [`ErrorCode::InvalidDateRange`] when `from > to`
/// - [`crate::LeafError::NotFound`] if the plant does not exist
pub fn history(
    conn: &Connection,
    plant_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<StatusTransition>> {
    check_range(from, to)?;
    ensure_plant_exists(conn, plant_id)?;

    let from_bound = to_us(from);
    let anchor = latest_status_through(conn, plant_id, from_bound)?.unwrap_or_default();

    let mut stmt = conn.prepare(
        "SELECT event_date_us, status FROM events
         WHERE plant_id = ?1 AND status IS NOT NULL
           AND event_date_us > ?2 AND event_date_us <= ?3
         ORDER BY event_date_us ASC, event_id ASC",
    )?;
    let rows = stmt.query_map(params![plant_id, from_bound, to_us(to)], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut changes = Vec::new();
    for row in rows {
        let (date_us, raw) = row?;
        let status = raw.parse::<PlantStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        changes.push((from_us(date_us), status));
    }

    let transitions = collapse(from, anchor, changes);
    tracing::debug!(plant_id, %from, %to, transitions = transitions.len(), "built status history");
    Ok(transitions)
}

/// [`history`] over an in-memory log, in any order.
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidDateRange`] when `from > to`.
pub fn transitions_from_log(
    events: &[Event],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<StatusTransition>> {
    check_range(from, to)?;

    let mut in_range: Vec<&Event> = events
        .iter()
        .filter(|e| e.status.is_some() && e.event_date > from && e.event_date <= to)
        .collect();
    in_range.sort_by(|a, b| a.log_order(b));

    let changes = in_range
        .into_iter()
        .filter_map(|e| e.status.map(|status| (e.event_date, status)));
    Ok(collapse(from, status_from_log(events, from), changes))
}

/// Replay a history: the status in force at `at`, or `None` before the anchor.
#[must_use]
pub fn replay(transitions: &[StatusTransition], at: DateTime<Utc>) -> Option<PlantStatus> {
    transitions
        .iter()
        .take_while(|t| t.at <= at)
        .last()
        .map(|t| t.status)
}

/// Resolve optional textual bounds: `from` falls back to `default_from`,
/// `to` to `now`.
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidTimestamp`] for an unparseable bound and
/// [`ErrorCode::InvalidDateRange`] when the resolved `from > to`.
pub fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    default_from: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let from = from.map(parse_instant).transpose()?.unwrap_or(default_from);
    let to = to.map(parse_instant).transpose()?.unwrap_or(now);
    check_range(from, to)?;
    Ok((from, to))
}

fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
    if from > to {
        return Err(LeafError::validation(
            ErrorCode::InvalidDateRange,
            format!("history range starts after it ends ({from} > {to})"),
        ));
    }
    Ok(())
}

fn collapse(
    from: DateTime<Utc>,
    anchor: PlantStatus,
    changes: impl IntoIterator<Item = (DateTime<Utc>, PlantStatus)>,
) -> Vec<StatusTransition> {
    let mut out = vec![StatusTransition {
        at: from,
        status: anchor,
    }];
    let mut current = anchor;
    let mut changes = changes.into_iter().peekable();
    while let Some((at, mut status)) = changes.next() {
        // Only the last status written at an instant is ever in force.
        while let Some(&(_, later)) = changes.peek().filter(|(next_at, _)| *next_at == at) {
            status = later;
            changes.next();
        }
        if status != current {
            out.push(StatusTransition { at, status });
            current = status;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::event::{EventFilter, EventType, NewEvent};
    use crate::model::plant::NewPlant;
    use crate::records::insert_plant;
    use crate::status::status_at;
    use crate::store::{append_event, query_events};

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).expect("timestamp")
    }

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().expect("store");
        let plant_id =
            insert_plant(&conn, &NewPlant::named("Calathea"), at("2024-01-01")).expect("plant");
        for event in [
            NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
            NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-10")),
            NewEvent::new(plant_id, EventType::Watering, at("2024-02-11")),
            NewEvent::new(plant_id, EventType::DiseaseObserved, at("2024-03-01")),
            NewEvent::new(plant_id, EventType::Treatment, at("2024-03-05")),
        ] {
            append_event(&conn, &event, event.event_date).expect("append");
        }
        (conn, plant_id)
    }

    #[test]
    fn history_starts_with_anchor_and_collapses_repeats() {
        let (conn, plant_id) = setup();
        let got = history(&conn, plant_id, at("2024-01-01"), at("2024-04-01")).expect("history");
        let expected = vec![
            StatusTransition { at: at("2024-01-01"), status: PlantStatus::Unknown },
            StatusTransition { at: at("2024-02-01"), status: PlantStatus::Healthy },
            StatusTransition { at: at("2024-03-01"), status: PlantStatus::Sick },
            StatusTransition { at: at("2024-03-05"), status: PlantStatus::Recovering },
        ];
        assert_eq!(got, expected);
    }

    #[test]
    fn anchor_reflects_status_in_force_at_from() {
        let (conn, plant_id) = setup();
        let got = history(&conn, plant_id, at("2024-02-15"), at("2024-03-02")).expect("history");
        assert_eq!(
            got,
            vec![
                StatusTransition { at: at("2024-02-15"), status: PlantStatus::Healthy },
                StatusTransition { at: at("2024-03-01"), status: PlantStatus::Sick },
            ]
        );
    }

    #[test]
    fn empty_range_returns_only_anchor() {
        let (conn, plant_id) = setup();
        let got = history(&conn, plant_id, at("2024-03-01"), at("2024-03-01")).expect("history");
        assert_eq!(
            got,
            vec![StatusTransition { at: at("2024-03-01"), status: PlantStatus::Sick }]
        );
    }

    #[test]
    fn same_instant_changes_yield_only_the_net_status() {
        let (conn, plant_id) = setup();
        for status in [PlantStatus::Sick, PlantStatus::Healthy] {
            let event = NewEvent::status_change(plant_id, status, at("2024-03-10"));
            append_event(&conn, &event, event.event_date).expect("append");
        }
        let from = at("2024-03-06");
        let to = at("2024-04-01");
        let got = history(&conn, plant_id, from, to).expect("history");
        assert_eq!(
            got,
            vec![
                StatusTransition { at: from, status: PlantStatus::Recovering },
                StatusTransition { at: at("2024-03-10"), status: PlantStatus::Healthy },
            ]
        );
        assert_eq!(
            status_at(&conn, plant_id, at("2024-03-10")).expect("status"),
            PlantStatus::Healthy
        );

        let events = query_events(&conn, plant_id, &EventFilter::default()).expect("events");
        assert_eq!(transitions_from_log(&events, from, to).expect("log"), got);
    }

    #[test]
    fn same_instant_changes_that_cancel_out_are_dropped() {
        let (conn, plant_id) = setup();
        for status in [PlantStatus::Dormant, PlantStatus::Recovering] {
            let event = NewEvent::status_change(plant_id, status, at("2024-03-20"));
            append_event(&conn, &event, event.event_date).expect("append");
        }
        let got = history(&conn, plant_id, at("2024-03-06"), at("2024-04-01")).expect("history");
        assert_eq!(
            got,
            vec![StatusTransition { at: at("2024-03-06"), status: PlantStatus::Recovering }]
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let (conn, plant_id) = setup();
        let err = history(&conn, plant_id, at("2024-03-01"), at("2024-02-01")).expect_err("range");
        assert_eq!(err.error_code(), ErrorCode::InvalidDateRange);
    }

    #[test]
    fn replay_matches_status_at() {
        let (conn, plant_id) = setup();
        let from = at("2024-01-15");
        let to = at("2024-03-10");
        let transitions = history(&conn, plant_id, from, to).expect("history");
        for probe in ["2024-01-15", "2024-02-01", "2024-02-20", "2024-03-01", "2024-03-07"] {
            assert_eq!(
                replay(&transitions, at(probe)),
                Some(status_at(&conn, plant_id, at(probe)).expect("status")),
                "{probe}"
            );
        }
        assert_eq!(replay(&transitions, at("2024-01-01")), None);
    }

    #[test]
    fn log_variant_matches_store_variant() {
        let (conn, plant_id) = setup();
        let events = query_events(&conn, plant_id, &EventFilter::default()).expect("events");
        let from = at("2024-01-20");
        let to = at("2024-03-31");
        assert_eq!(
            transitions_from_log(&events, from, to).expect("log"),
            history(&conn, plant_id, from, to).expect("store")
        );
    }

    #[test]
    fn resolve_range_applies_defaults() {
        let now = at("2024-06-01T12:00:00Z");
        let default_from = at("2024-01-01");
        assert_eq!(
            resolve_range(None, None, default_from, now).expect("range"),
            (default_from, now)
        );
        assert_eq!(
            resolve_range(Some("2024-03-01"), None, default_from, now).expect("range"),
            (at("2024-03-01"), now)
        );
        assert!(resolve_range(Some("2025-01-01"), None, default_from, now).is_err());
        assert!(resolve_range(Some("soon"), None, default_from, now).is_err());
    }
}

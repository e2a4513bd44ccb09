//! Point-in-time status reconstruction.
//!
//! A plant's status at instant `t` is the effective status of the latest
//! status-relevant event with `event_date <= t`, ordered by
//! `(event_date, event_id)`, or [`PlantStatus::Unknown`] when there is none.
//! Events dated after `t` never influence the answer, whenever they were
//! recorded.
//!
//! The `plants.current_status` column is a cache of the same rule with
//! `t = +inf`. It is refreshed in the append transaction and can be verified
//! or rebuilt from the log.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::error::Result;
use crate::event::Event;
use crate::model::status::PlantStatus;
use crate::records::ensure_plant_exists;
use crate::time::to_us;

/// Status of `plant_id` as of `at`.
///
/// Runs a single `LIMIT 1` probe on the partial status index.
///
/// # Errors
///
/// Returns [`crate::LeafError::NotFound`] if the plant does not exist.
pub fn status_at(conn: &Connection, plant_id: i64, at: DateTime<Utc>) -> Result<PlantStatus> {
    ensure_plant_exists(conn, plant_id)?;
    Ok(latest_status_through(conn, plant_id, to_us(at))?.unwrap_or_default())
}

/// Same rule as [`status_at`], evaluated over an in-memory log.
///
/// The slice may be in any order.
#[must_use]
pub fn status_from_log(events: &[Event], at: DateTime<Utc>) -> PlantStatus {
    events
        .iter()
        .filter(|event| event.status.is_some() && event.event_date <= at)
        .max_by(|a, b| a.log_order(b))
        .and_then(|event| event.status)
        .unwrap_or_default()
}

/// Latest effective status with `event_date_us <= through_us`.
pub(crate) fn latest_status_through(
    conn: &Connection,
    plant_id: i64,
    through_us: i64,
) -> Result<Option<PlantStatus>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT status FROM events
             WHERE plant_id = ?1 AND status IS NOT NULL AND event_date_us <= ?2
             ORDER BY event_date_us DESC, event_id DESC
             LIMIT 1",
            params![plant_id, through_us],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|value| value.parse::<PlantStatus>())
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
                .into()
        })
}

/// Recompute `plants.current_status` for one plant from its log.
///
/// Callers that append hold the write transaction already.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the read or update fails.
pub(crate) fn refresh_current_status(conn: &Connection, plant_id: i64) -> Result<PlantStatus> {
    let status = latest_status_through(conn, plant_id, i64::MAX)?.unwrap_or_default();
    conn.execute(
        "UPDATE plants SET current_status = ?1 WHERE plant_id = ?2",
        params![status.as_str(), plant_id],
    )?;
    Ok(status)
}

/// A plant whose cached status disagrees with its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDrift {
    pub plant_id: i64,
    pub cached: PlantStatus,
    pub derived: PlantStatus,
}

/// Compare every plant's cached status with the one derived from its log.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails or a stored status
/// is not a known value.
pub fn verify_status_cache(conn: &Connection) -> Result<Vec<StatusDrift>> {
    let mut stmt = conn.prepare(
        "SELECT p.plant_id, p.current_status,
                COALESCE((
                    SELECT e.status FROM events e
                    WHERE e.plant_id = p.plant_id AND e.status IS NOT NULL
                    ORDER BY e.event_date_us DESC, e.event_id DESC
                    LIMIT 1
                ), 'unknown')
         FROM plants p
         ORDER BY p.plant_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut drift = Vec::new();
    for row in rows {
        let (plant_id, cached, derived) = row?;
        let cached = parse_stored(&cached, 1)?;
        let derived = parse_stored(&derived, 2)?;
        if cached != derived {
            drift.push(StatusDrift {
                plant_id,
                cached,
                derived,
            });
        }
    }
    Ok(drift)
}

/// Rewrite every drifted cache entry from the log; returns how many changed.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the transaction fails; the cache
/// is left untouched in that case.
pub fn rebuild_status_cache(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let drift = verify_status_cache(&tx)?;
    for entry in &drift {
        tracing::warn!(
            plant_id = entry.plant_id,
            cached = %entry.cached,
            derived = %entry.derived,
            "status cache drift, rewriting"
        );
        tx.execute(
            "UPDATE plants SET current_status = ?1 WHERE plant_id = ?2",
            params![entry.derived.as_str(), entry.plant_id],
        )?;
    }
    tx.execute(
        "UPDATE store_meta SET last_cache_rebuild_at_us = ?1 WHERE id = 1",
        params![to_us(now)],
    )?;
    tx.commit()?;

    tracing::info!(rewritten = drift.len(), "rebuilt status cache");
    Ok(drift.len())
}

fn parse_stored(raw: &str, column: usize) -> Result<PlantStatus> {
    raw.parse::<PlantStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::event::{EventType, NewEvent};
    use crate::model::plant::NewPlant;
    use crate::records::{insert_plant, require_plant};
    use crate::store::append_event;
    use crate::time::parse_instant;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).expect("timestamp")
    }

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().expect("store");
        let plant_id =
            insert_plant(&conn, &NewPlant::named("Ficus"), at("2024-01-01")).expect("plant");
        (conn, plant_id)
    }

    fn append(conn: &Connection, event: &NewEvent) -> i64 {
        append_event(conn, event, event.event_date).expect("append")
    }

    #[test]
    fn no_events_is_unknown() {
        let (conn, plant_id) = setup();
        assert_eq!(
            status_at(&conn, plant_id, at("2030-01-01")).expect("status"),
            PlantStatus::Unknown
        );
    }

    #[test]
    fn status_is_bounded_by_event_date() {
        let (conn, plant_id) = setup();
        append(
            &conn,
            &NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
        );

        assert_eq!(
            status_at(&conn, plant_id, at("2024-01-15")).expect("status"),
            PlantStatus::Unknown
        );
        assert_eq!(
            status_at(&conn, plant_id, at("2024-02-01")).expect("status"),
            PlantStatus::Healthy
        );
        assert_eq!(
            status_at(&conn, plant_id, at("2024-03-01")).expect("status"),
            PlantStatus::Healthy
        );
    }

    #[test]
    fn same_timestamp_resolves_by_insertion_order() {
        let (conn, plant_id) = setup();
        let t = at("2024-02-01T09:00:00Z");
        append(&conn, &NewEvent::status_change(plant_id, PlantStatus::Sick, t));
        append(&conn, &NewEvent::status_change(plant_id, PlantStatus::Recovering, t));
        assert_eq!(status_at(&conn, plant_id, t).expect("status"), PlantStatus::Recovering);
    }

    #[test]
    fn care_events_do_not_change_status() {
        let (conn, plant_id) = setup();
        append(
            &conn,
            &NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
        );
        append(&conn, &NewEvent::new(plant_id, EventType::Watering, at("2024-02-02")));
        append(&conn, &NewEvent::new(plant_id, EventType::Repotting, at("2024-02-03")));
        assert_eq!(
            status_at(&conn, plant_id, at("2024-02-04")).expect("status"),
            PlantStatus::Healthy
        );
    }

    #[test]
    fn implied_statuses_apply() {
        let (conn, plant_id) = setup();
        append(&conn, &NewEvent::new(plant_id, EventType::Death, at("2024-05-01")));
        assert_eq!(
            status_at(&conn, plant_id, at("2024-05-02")).expect("status"),
            PlantStatus::Dead
        );
    }

    #[test]
    fn missing_plant_is_not_found() {
        let (conn, _) = setup();
        assert!(status_at(&conn, 404, at("2024-01-01")).expect_err("missing").is_not_found());
    }

    #[test]
    fn in_memory_rule_matches_store() {
        let (conn, plant_id) = setup();
        append(&conn, &NewEvent::new(plant_id, EventType::PestObserved, at("2024-02-10")));
        append(
            &conn,
            &NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
        );
        append(&conn, &NewEvent::new(plant_id, EventType::Treatment, at("2024-02-20")));

        let events = crate::store::query_events(&conn, plant_id, &crate::EventFilter::default())
            .expect("events");
        for probe in ["2024-01-01", "2024-02-05", "2024-02-15", "2024-03-01"] {
            assert_eq!(
                status_from_log(&events, at(probe)),
                status_at(&conn, plant_id, at(probe)).expect("status"),
                "{probe}"
            );
        }
    }

    #[test]
    fn verify_and_rebuild_repair_a_corrupted_cache() {
        let (conn, plant_id) = setup();
        append(
            &conn,
            &NewEvent::status_change(plant_id, PlantStatus::Dormant, at("2024-02-01")),
        );
        assert!(verify_status_cache(&conn).expect("verify").is_empty());

        conn.execute(
            "UPDATE plants SET current_status = 'healthy' WHERE plant_id = ?1",
            params![plant_id],
        )
        .expect("corrupt cache");
        let drift = verify_status_cache(&conn).expect("verify");
        assert_eq!(
            drift,
            vec![StatusDrift {
                plant_id,
                cached: PlantStatus::Healthy,
                derived: PlantStatus::Dormant,
            }]
        );

        assert_eq!(rebuild_status_cache(&conn, at("2024-03-01")).expect("rebuild"), 1);
        assert_eq!(
            require_plant(&conn, plant_id).expect("plant").current_status,
            PlantStatus::Dormant
        );
        let rebuilt_at: i64 = conn
            .query_row(
                "SELECT last_cache_rebuild_at_us FROM store_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .expect("meta");
        assert_eq!(rebuilt_at, to_us(at("2024-03-01")));
    }
}

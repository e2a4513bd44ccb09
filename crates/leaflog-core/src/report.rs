//! Per-plant reports and the collection overview.
//!
//! Both are evaluated as of a caller-supplied `now`: events dated after it
//! are ignored, so a report for a past instant reads the way it would have
//! then.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::error::Result;
use crate::event::EventType;
use crate::growth::latest_measurement;
use crate::model::measurement::MeasurementSample;
use crate::model::plant::Plant;
use crate::model::status::PlantStatus;
use crate::records::require_plant;
use crate::status::latest_status_through;
use crate::time::{from_us, to_us};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTypeCount {
    pub event_type: EventType,
    pub count: u64,
}

/// Everything worth knowing about one plant at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantReport {
    pub plant: Plant,
    pub status: PlantStatus,
    pub as_of: DateTime<Utc>,
    pub days_since_planting: i64,
    pub total_events: u64,
    /// Only types that occur, in [`EventType::ALL`] order.
    pub events_by_type: Vec<EventTypeCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watering: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fertilizing: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_measurement: Option<MeasurementSample>,
    pub active_reminders: u64,
    pub overdue_reminders: u64,
}

/// Build a report for `plant_id` as of `now`.
///
/// # Errors
///
/// Returns [`crate::LeafError::NotFound`] if the plant does not exist.
pub fn plant_report(conn: &Connection, plant_id: i64, now: DateTime<Utc>) -> Result<PlantReport> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let now_us = to_us(now);

    let plant = require_plant(&tx, plant_id)?;
    let status = latest_status_through(&tx, plant_id, now_us)?.unwrap_or_default();

    let mut by_type: Vec<(String, i64)> = Vec::new();
    {
        let mut stmt = tx.prepare(
            "SELECT event_type, COUNT(*) FROM events
             WHERE plant_id = ?1 AND event_date_us <= ?2
             GROUP BY event_type",
        )?;
        let rows = stmt.query_map(params![plant_id, now_us], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            by_type.push(row?);
        }
    }
    let events_by_type: Vec<EventTypeCount> = EventType::ALL
        .iter()
        .filter_map(|event_type| {
            by_type
                .iter()
                .find(|(raw, _)| raw == event_type.as_str())
                .map(|(_, n)| EventTypeCount {
                    event_type: *event_type,
                    count: u64::try_from(*n).unwrap_or(0),
                })
        })
        .collect();
    let total_events = events_by_type.iter().map(|c| c.count).sum();

    let last_watering = last_event_of(&tx, plant_id, EventType::Watering, now_us)?;
    let last_fertilizing = last_event_of(&tx, plant_id, EventType::Fertilizing, now_us)?;
    let latest_measurement = latest_measurement(&tx, plant_id, now)?;

    let (active_reminders, overdue_reminders): (i64, i64) = tx.query_row(
        "SELECT COUNT(*), COALESCE(SUM(next_due_us < ?2), 0) FROM reminders
         WHERE plant_id = ?1 AND is_active = 1",
        params![plant_id, now_us],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    tx.commit()?;

    let days_since_planting = (now.date_naive() - plant.planting_date).num_days();

    tracing::debug!(plant_id, %now, total_events, "built plant report");
    Ok(PlantReport {
        plant,
        status,
        as_of: now,
        days_since_planting,
        total_events,
        events_by_type,
        last_watering,
        last_fertilizing,
        latest_measurement,
        active_reminders: u64::try_from(active_reminders).unwrap_or(0),
        overdue_reminders: u64::try_from(overdue_reminders).unwrap_or(0),
    })
}

fn last_event_of(
    conn: &Connection,
    plant_id: i64,
    event_type: EventType,
    now_us: i64,
) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<i64> = conn.query_row(
        "SELECT MAX(event_date_us) FROM events
         WHERE plant_id = ?1 AND event_type = ?2 AND event_date_us <= ?3",
        params![plant_id, event_type.as_str(), now_us],
        |row| row.get(0),
    )?;
    Ok(latest.map(from_us))
}

/// One row of the collection overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantOverview {
    pub plant_id: i64,
    pub common_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: PlantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watering: Option<DateTime<Utc>>,
    /// Earliest `next_due` among active reminders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<DateTime<Utc>>,
}

/// One row per plant, ordered by name.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn plants_overview(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<PlantOverview>> {
    let mut stmt = conn.prepare(
        "SELECT p.plant_id, p.common_name, p.location,
                COALESCE((
                    SELECT e.status FROM events e
                    WHERE e.plant_id = p.plant_id AND e.status IS NOT NULL
                      AND e.event_date_us <= ?1
                    ORDER BY e.event_date_us DESC, e.event_id DESC
                    LIMIT 1
                ), 'unknown'),
                (SELECT MAX(e.event_date_us) FROM events e
                 WHERE e.plant_id = p.plant_id AND e.event_type = 'watering'
                   AND e.event_date_us <= ?1),
                (SELECT MIN(r.next_due_us) FROM reminders r
                 WHERE r.plant_id = p.plant_id AND r.is_active = 1)
         FROM plants p
         ORDER BY p.common_name COLLATE NOCASE ASC, p.plant_id ASC",
    )?;
    let rows = stmt.query_map(params![to_us(now)], |row| {
        let raw_status: String = row.get(3)?;
        let status = raw_status.parse::<PlantStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(PlantOverview {
            plant_id: row.get(0)?,
            common_name: row.get(1)?,
            location: row.get(2)?,
            status,
            last_watering: row.get::<_, Option<i64>>(4)?.map(from_us),
            next_due: row.get::<_, Option<i64>>(5)?.map(from_us),
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

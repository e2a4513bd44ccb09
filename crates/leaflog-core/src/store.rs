//! The append-only event store.
//!
//! Appends run inside a `BEGIN IMMEDIATE` transaction so the event row and the
//! refreshed `plants.current_status` cache become visible together. Events and
//! measurements are never updated afterwards (triggers enforce this).

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params, types::ToSql};

use crate::error::Result;
use crate::event::{Event, EventFilter, EventId, NewEvent};
use crate::model::measurement::{MeasurementId, NewMeasurement};
use crate::records::{EVENT_COLUMNS, ensure_plant_exists, row_to_event};
use crate::status::refresh_current_status;
use crate::time::to_us;

/// Append an event and return its id.
///
/// The effective status is resolved before the write and stored with the row.
/// `recorded_at` is bookkeeping only; reconstruction reads `event_date`.
///
/// # Errors
///
/// - [`crate::LeafError::NotFound`] if the plant does not exist
/// - [`crate::LeafError::Validation`] on an invalid payload
/// - [`crate::LeafError::Storage`] if the write fails; nothing is persisted
pub fn append_event(
    conn: &Connection,
    event: &NewEvent,
    recorded_at: DateTime<Utc>,
) -> Result<EventId> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let event_id = append_event_in(&tx, event, recorded_at)?;
    tx.commit()?;
    Ok(event_id)
}

/// Append inside a transaction the caller already holds.
pub(crate) fn append_event_in(
    conn: &Connection,
    event: &NewEvent,
    recorded_at: DateTime<Utc>,
) -> Result<EventId> {
    let status = event.effective_status()?;
    ensure_plant_exists(conn, event.plant_id)?;

    conn.execute(
        "INSERT INTO events (plant_id, event_type, event_date_us, description, amount, \
         performed_by, status, recorded_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.plant_id,
            event.event_type.as_str(),
            to_us(event.event_date),
            event.description,
            event.amount,
            event.performed_by,
            status.map(|s| s.as_str()),
            to_us(recorded_at),
        ],
    )?;
    let event_id = conn.last_insert_rowid();

    if status.is_some() {
        refresh_current_status(conn, event.plant_id)?;
    }

    tracing::info!(
        event_id,
        plant_id = event.plant_id,
        event_type = %event.event_type,
        event_date = %event.event_date,
        status = status.map(|s| s.as_str()),
        "appended event"
    );
    Ok(event_id)
}

/// Append a growth measurement and return its id.
///
/// # Errors
///
/// - [`crate::LeafError::NotFound`] if the plant does not exist
/// - [`crate::LeafError::Validation`] for an empty or negative sample
pub fn append_measurement(conn: &Connection, measurement: &NewMeasurement) -> Result<MeasurementId> {
    measurement.validate()?;
    ensure_plant_exists(conn, measurement.plant_id)?;

    conn.execute(
        "INSERT INTO growth_measurements (plant_id, height_cm, width_cm, leaf_count, \
         flower_count, notes, taken_at_us) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            measurement.plant_id,
            measurement.height_cm,
            measurement.width_cm,
            measurement.leaf_count,
            measurement.flower_count,
            measurement.notes,
            to_us(measurement.taken_at),
        ],
    )?;
    let measurement_id = conn.last_insert_rowid();
    tracing::info!(
        measurement_id,
        plant_id = measurement.plant_id,
        taken_at = %measurement.taken_at,
        "appended measurement"
    );
    Ok(measurement_id)
}

/// Events for one plant, filtered and ordered by `(event_date, event_id)`.
///
/// # Errors
///
/// Returns [`crate::LeafError::NotFound`] if the plant does not exist.
pub fn query_events(conn: &Connection, plant_id: i64, filter: &EventFilter) -> Result<Vec<Event>> {
    ensure_plant_exists(conn, plant_id)?;

    let mut sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE plant_id = ?1");
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(plant_id)];

    if !filter.event_types.is_empty() {
        let start = values.len() + 1;
        let placeholders: Vec<String> = (start..start + filter.event_types.len())
            .map(|i| format!("?{i}"))
            .collect();
        sql.push_str(&format!(" AND event_type IN ({})", placeholders.join(", ")));
        for event_type in &filter.event_types {
            values.push(Box::new(event_type.as_str()));
        }
    }
    if filter.status_relevant_only {
        sql.push_str(" AND status IS NOT NULL");
    }
    if let Some(since) = filter.since {
        values.push(Box::new(to_us(since)));
        sql.push_str(&format!(" AND event_date_us >= ?{}", values.len()));
    }
    if let Some(until) = filter.until {
        values.push(Box::new(to_us(until)));
        sql.push_str(&format!(" AND event_date_us <= ?{}", values.len()));
    }

    sql.push(' ');
    sql.push_str(filter.order.sql_clause());

    if let Some(limit) = filter.limit {
        values.push(Box::new(i64::from(limit)));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    let refs: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(refs.as_slice(), row_to_event)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Total number of events recorded for a plant.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn count_events(conn: &Connection, plant_id: i64) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE plant_id = ?1",
        params![plant_id],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

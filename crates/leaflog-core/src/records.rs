//! Plain record access for plants and reminders.
//!
//! Nothing here derives state; these are the key-lookup readers and
//! pass-through writers the temporal core and the CLI share. Row mappers for
//! every table live here too so each column list is spelled once.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::str::FromStr;

use crate::error::{ErrorCode, LeafError, RecordKind, Result};
use crate::event::Event;
use crate::model::measurement::MeasurementSample;
use crate::model::notification::Notification;
use crate::model::plant::{NewPlant, Plant, PlantUpdate};
use crate::model::reminder::{Frequency, NewReminder, Reminder};
use crate::time::{from_us, to_us};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

pub(crate) const PLANT_COLUMNS: &str = "plant_id, common_name, scientific_name, variety, \
     location, planting_date, acquisition_source, notes, current_status, created_at_us";

pub(crate) const EVENT_COLUMNS: &str =
    "event_id, plant_id, event_type, event_date_us, description, amount, performed_by, status";

pub(crate) const REMINDER_COLUMNS: &str =
    "reminder_id, plant_id, reminder_type, frequency_secs, next_due_us, is_active, created_at_us";

pub(crate) const MEASUREMENT_COLUMNS: &str =
    "measurement_id, height_cm, width_cm, leaf_count, flower_count, notes, taken_at_us";

pub(crate) const NOTIFICATION_COLUMNS: &str = "notification_id, reminder_id, plant_id, message, \
     due_at_us, is_read, read_at_us, created_at_us";

// ---------------------------------------------------------------------------
// Plants
// ---------------------------------------------------------------------------

/// Insert a plant and return its id.
///
/// `planting_date` defaults to the UTC date of `now`.
///
/// # Errors
///
/// Returns [`ErrorCode::InvalidPlant`] for a blank common name and
/// [`LeafError::Storage`] if the insert fails.
pub fn insert_plant(conn: &Connection, plant: &NewPlant, now: DateTime<Utc>) -> Result<i64> {
    check_common_name(&plant.common_name)?;
    let planting_date = plant.planting_date.unwrap_or_else(|| now.date_naive());
    conn.execute(
        "INSERT INTO plants (common_name, scientific_name, variety, location, \
         planting_date, acquisition_source, notes, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            plant.common_name.trim(),
            plant.scientific_name,
            plant.variety,
            plant.location,
            planting_date.format("%Y-%m-%d").to_string(),
            plant.acquisition_source,
            plant.notes,
            to_us(now),
        ],
    )?;
    let plant_id = conn.last_insert_rowid();
    tracing::info!(plant_id, common_name = %plant.common_name, "added plant");
    Ok(plant_id)
}

/// Fetch a plant by id, or `None`.
///
/// # Errors
///
/// Returns [`LeafError::Storage`] if the query fails.
pub fn get_plant(conn: &Connection, plant_id: i64) -> Result<Option<Plant>> {
    let sql = format!("SELECT {PLANT_COLUMNS} FROM plants WHERE plant_id = ?1");
    Ok(conn
        .query_row(&sql, params![plant_id], row_to_plant)
        .optional()?)
}

/// Fetch a plant by id.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] when no such plant exists.
pub fn require_plant(conn: &Connection, plant_id: i64) -> Result<Plant> {
    get_plant(conn, plant_id)?.ok_or(LeafError::plant_not_found(plant_id))
}

/// Fail with [`LeafError::NotFound`] unless the plant exists.
///
/// # Errors
///
/// Returns `NotFound` for a missing plant, `Storage` if the query fails.
pub fn ensure_plant_exists(conn: &Connection, plant_id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM plants WHERE plant_id = ?1)",
        params![plant_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(LeafError::plant_not_found(plant_id))
    }
}

/// All plants ordered by id.
///
/// # Errors
///
/// Returns [`LeafError::Storage`] if the query fails.
pub fn list_plants(conn: &Connection) -> Result<Vec<Plant>> {
    let sql = format!("SELECT {PLANT_COLUMNS} FROM plants ORDER BY plant_id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_plant)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Change a plant's descriptive fields and return the stored result.
///
/// The status cache is left alone; an empty update is a no-op read.
///
/// # Errors
///
/// - [`ErrorCode::InvalidPlant`] when the new common name is blank
/// - [`LeafError::NotFound`] if the plant does not exist
pub fn update_plant(conn: &Connection, plant_id: i64, update: &PlantUpdate) -> Result<Plant> {
    if let Some(name) = &update.common_name {
        check_common_name(name)?;
    }
    let mut plant = require_plant(conn, plant_id)?;
    if update.is_empty() {
        return Ok(plant);
    }
    update.apply_to(&mut plant);

    conn.execute(
        "UPDATE plants SET common_name = ?1, scientific_name = ?2, variety = ?3, \
         location = ?4, planting_date = ?5, acquisition_source = ?6, notes = ?7 \
         WHERE plant_id = ?8",
        params![
            plant.common_name,
            plant.scientific_name,
            plant.variety,
            plant.location,
            plant.planting_date.format("%Y-%m-%d").to_string(),
            plant.acquisition_source,
            plant.notes,
            plant_id,
        ],
    )?;
    tracing::info!(plant_id, common_name = %plant.common_name, "updated plant");
    Ok(plant)
}

fn check_common_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LeafError::validation(
            ErrorCode::InvalidPlant,
            "plant common name must not be blank",
        ));
    }
    Ok(())
}

/// Delete a plant; its events, measurements and reminders cascade.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] when no such plant exists.
pub fn delete_plant(conn: &Connection, plant_id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM plants WHERE plant_id = ?1", params![plant_id])?;
    if deleted == 0 {
        return Err(LeafError::plant_not_found(plant_id));
    }
    tracing::info!(plant_id, "deleted plant");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// Insert a reminder and return its id.
///
/// `next_due` defaults to `now`, so a fresh reminder without a due date is
/// due immediately.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] if the plant does not exist.
pub fn insert_reminder(
    conn: &Connection,
    reminder: &NewReminder,
    now: DateTime<Utc>,
) -> Result<i64> {
    ensure_plant_exists(conn, reminder.plant_id)?;
    let next_due = reminder.next_due.unwrap_or(now);
    conn.execute(
        "INSERT INTO reminders (plant_id, reminder_type, frequency_secs, next_due_us, \
         is_active, created_at_us) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![
            reminder.plant_id,
            reminder.reminder_type.as_str(),
            reminder.frequency.as_secs(),
            to_us(next_due),
            to_us(now),
        ],
    )?;
    let reminder_id = conn.last_insert_rowid();
    tracing::info!(
        reminder_id,
        plant_id = reminder.plant_id,
        reminder_type = %reminder.reminder_type,
        frequency = %reminder.frequency,
        "added reminder"
    );
    Ok(reminder_id)
}

/// Fetch a reminder by id.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] when no such reminder exists.
pub fn get_reminder(conn: &Connection, reminder_id: i64) -> Result<Reminder> {
    let sql = format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE reminder_id = ?1");
    conn.query_row(&sql, params![reminder_id], row_to_reminder)
        .optional()?
        .ok_or(LeafError::NotFound {
            kind: RecordKind::Reminder,
            id: reminder_id,
        })
}

/// Reminders for one plant, soonest first, active or not.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] if the plant does not exist.
pub fn plant_reminders(conn: &Connection, plant_id: i64) -> Result<Vec<Reminder>> {
    ensure_plant_exists(conn, plant_id)?;
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE plant_id = ?1 \
         ORDER BY next_due_us ASC, reminder_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![plant_id], row_to_reminder)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Stop a reminder from firing. Idempotent.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] when no such reminder exists.
pub fn deactivate_reminder(conn: &Connection, reminder_id: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE reminders SET is_active = 0 WHERE reminder_id = ?1",
        params![reminder_id],
    )?;
    if updated == 0 {
        return Err(LeafError::NotFound {
            kind: RecordKind::Reminder,
            id: reminder_id,
        });
    }
    tracing::info!(reminder_id, "deactivated reminder");
    Ok(())
}

/// Delete a reminder; its notifications cascade.
///
/// # Errors
///
/// Returns [`LeafError::NotFound`] when no such reminder exists.
pub fn delete_reminder(conn: &Connection, reminder_id: i64) -> Result<()> {
    let deleted = conn.execute(
        "DELETE FROM reminders WHERE reminder_id = ?1",
        params![reminder_id],
    )?;
    if deleted == 0 {
        return Err(LeafError::NotFound {
            kind: RecordKind::Reminder,
            id: reminder_id,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u32>> {
    let raw: Option<i64> = row.get(idx)?;
    raw.map(|value| {
        u32::try_from(value)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn row_to_plant(row: &Row<'_>) -> rusqlite::Result<Plant> {
    Ok(Plant {
        plant_id: row.get(0)?,
        common_name: row.get(1)?,
        scientific_name: row.get(2)?,
        variety: row.get(3)?,
        location: row.get(4)?,
        planting_date: parse_column(row, 5)?,
        acquisition_source: row.get(6)?,
        notes: row.get(7)?,
        current_status: parse_column(row, 8)?,
        created_at: from_us(row.get(9)?),
    })
}

pub(crate) fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        event_id: row.get(0)?,
        plant_id: row.get(1)?,
        event_type: parse_column(row, 2)?,
        event_date: from_us(row.get(3)?),
        description: row.get(4)?,
        amount: row.get(5)?,
        performed_by: row.get(6)?,
        status: parse_optional_column(row, 7)?,
    })
}

pub(crate) fn row_to_reminder(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    let frequency_secs: i64 = row.get(3)?;
    let frequency = Frequency::from_secs(frequency_secs)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;
    Ok(Reminder {
        reminder_id: row.get(0)?,
        plant_id: row.get(1)?,
        reminder_type: parse_column(row, 2)?,
        frequency,
        next_due: from_us(row.get(4)?),
        is_active: row.get::<_, i64>(5)? != 0,
        created_at: from_us(row.get(6)?),
    })
}

pub(crate) fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        notification_id: row.get(0)?,
        reminder_id: row.get(1)?,
        plant_id: row.get(2)?,
        message: row.get(3)?,
        due_at: from_us(row.get(4)?),
        is_read: row.get::<_, i64>(5)? != 0,
        read_at: row.get::<_, Option<i64>>(6)?.map(from_us),
        created_at: from_us(row.get(7)?),
    })
}

pub(crate) fn row_to_measurement(row: &Row<'_>) -> rusqlite::Result<MeasurementSample> {
    Ok(MeasurementSample {
        measurement_id: row.get(0)?,
        height_cm: row.get(1)?,
        width_cm: row.get(2)?,
        leaf_count: count_column(row, 3)?,
        flower_count: count_column(row, 4)?,
        notes: row.get(5)?,
        taken_at: from_us(row.get(6)?),
    })
}

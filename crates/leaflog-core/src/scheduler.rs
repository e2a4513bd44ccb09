//! Reminder scheduling: overdue detection and completion.
//!
//! A reminder is overdue when it is active and `next_due < now`. Completing a
//! reminder advances `next_due` under a [`DriftPolicy`] and, for care-type
//! reminders, records the matching care event in the same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::error::{ErrorCode, LeafError, Result};
use crate::event::{EventId, NewEvent};
use crate::model::reminder::{DriftPolicy, Reminder};
use crate::records::{REMINDER_COLUMNS, get_reminder, row_to_reminder};
use crate::store::append_event_in;
use crate::time::{from_us, to_us};

/// `is_active && next_due < now`.
#[must_use]
pub fn is_overdue(reminder: &Reminder, now: DateTime<Utc>) -> bool {
    reminder.is_active && reminder.next_due < now
}

/// Active reminders, soonest first; ties by id.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn active_reminders(conn: &Connection) -> Result<Vec<Reminder>> {
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE is_active = 1 \
         ORDER BY next_due_us ASC, reminder_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_reminder)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Active reminders with `next_due < now`, most overdue first.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn overdue_reminders(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
    let sql = format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders WHERE is_active = 1 AND next_due_us < ?1 \
         ORDER BY next_due_us ASC, reminder_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![to_us(now)], row_to_reminder)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Outcome of [`complete_reminder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub reminder_id: i64,
    pub previous_due: DateTime<Utc>,
    pub next_due: DateTime<Utc>,
    /// The care event recorded for this completion, if the type maps to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
}

/// Mark a reminder done at `occurred_at` and reschedule it.
///
/// # Errors
///
/// - [`crate::LeafError::NotFound`] for an unknown reminder
/// - [`ErrorCode::ReminderInactive`] if the reminder was deactivated
/// - [`crate::LeafError::Storage`] if the transaction fails; nothing changes
pub fn complete_reminder(
    conn: &Connection,
    reminder_id: i64,
    occurred_at: DateTime<Utc>,
    policy: DriftPolicy,
    performed_by: Option<&str>,
) -> Result<Completion> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let reminder = get_reminder(&tx, reminder_id)?;
    if !reminder.is_active {
        return Err(LeafError::validation(
            ErrorCode::ReminderInactive,
            format!("reminder {reminder_id} is inactive and cannot be completed"),
        ));
    }

    let next_due = from_us(policy.next_due_us(
        to_us(reminder.next_due),
        reminder.frequency,
        to_us(occurred_at),
    ));

    let event_id = match reminder.reminder_type.event_type() {
        Some(event_type) => {
            let mut event = NewEvent::new(reminder.plant_id, event_type, occurred_at)
                .with_description(format!("Completed {} reminder", reminder.reminder_type));
            event.performed_by = performed_by.map(str::to_owned);
            Some(append_event_in(&tx, &event, occurred_at)?)
        }
        None => None,
    };

    tx.execute(
        "UPDATE reminders SET next_due_us = ?1 WHERE reminder_id = ?2",
        params![to_us(next_due), reminder_id],
    )?;
    tx.commit()?;

    tracing::info!(
        reminder_id,
        plant_id = reminder.plant_id,
        previous_due = %reminder.next_due,
        %next_due,
        ?policy,
        "completed reminder"
    );
    Ok(Completion {
        reminder_id,
        previous_due: reminder.next_due,
        next_due,
        event_id,
    })
}

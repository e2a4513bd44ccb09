//! Overdue-reminder notifications.
//!
//! A notification is keyed by `(reminder_id, due_at)`, so raising alerts is
//! idempotent per due date: re-running [`notify_overdue`] before a reminder is
//! completed adds nothing, and the next missed due date gets a fresh alert.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};

use crate::error::{LeafError, RecordKind, Result};
use crate::model::notification::Notification;
use crate::records::{NOTIFICATION_COLUMNS, row_to_notification};
use crate::scheduler::overdue_reminders;
use crate::time::to_us;

/// Default page size for [`unread_notifications`].
pub const DEFAULT_UNREAD_LIMIT: u32 = 20;

/// Raise an unread notification for every overdue reminder that does not
/// have one for its current due date. Returns how many were created.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the transaction fails.
pub fn notify_overdue(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let overdue = overdue_reminders(&tx, now)?;

    let mut created = 0;
    for reminder in &overdue {
        let common_name: String = tx.query_row(
            "SELECT common_name FROM plants WHERE plant_id = ?1",
            params![reminder.plant_id],
            |row| row.get(0),
        )?;
        let message = format!(
            "{} is overdue for {} (due {})",
            common_name,
            reminder.reminder_type,
            reminder.next_due.format("%Y-%m-%d %H:%M UTC")
        );
        created += tx.execute(
            "INSERT OR IGNORE INTO notifications \
             (reminder_id, plant_id, message, due_at_us, is_read, created_at_us) \
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                reminder.reminder_id,
                reminder.plant_id,
                message,
                to_us(reminder.next_due),
                to_us(now),
            ],
        )?;
    }
    tx.commit()?;

    tracing::info!(overdue = overdue.len(), created, "raised overdue notifications");
    Ok(created)
}

/// Unread notifications, newest first.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn unread_notifications(conn: &Connection, limit: u32) -> Result<Vec<Notification>> {
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE is_read = 0 \
         ORDER BY created_at_us DESC, notification_id DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![i64::from(limit)], row_to_notification)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Mark a notification read. Already-read notifications keep their original
/// `read_at`.
///
/// # Errors
///
/// Returns [`crate::LeafError::NotFound`] for an unknown id.
pub fn mark_notification_read(
    conn: &Connection,
    notification_id: i64,
    now: DateTime<Utc>,
) -> Result<Notification> {
    conn.execute(
        "UPDATE notifications SET is_read = 1, read_at_us = ?1 \
         WHERE notification_id = ?2 AND is_read = 0",
        params![to_us(now), notification_id],
    )?;

    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?1");
    let notification = conn
        .query_row(&sql, params![notification_id], row_to_notification)
        .optional()?
        .ok_or(LeafError::NotFound {
            kind: RecordKind::Notification,
            id: notification_id,
        })?;
    tracing::debug!(notification_id, "marked notification read");
    Ok(notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::model::plant::NewPlant;
    use crate::model::reminder::{DriftPolicy, Frequency, NewReminder, ReminderType};
    use crate::records::{insert_plant, insert_reminder};
    use crate::scheduler::complete_reminder;
    use crate::time::parse_instant;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).expect("timestamp")
    }

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().expect("store");
        let plant_id =
            insert_plant(&conn, &NewPlant::named("Orchid"), at("2024-01-01")).expect("plant");
        let reminder_id = insert_reminder(
            &conn,
            &NewReminder {
                plant_id,
                reminder_type: ReminderType::Watering,
                frequency: Frequency::days(7).expect("freq"),
                next_due: Some(at("2024-01-10")),
            },
            at("2024-01-01"),
        )
        .expect("reminder");
        (conn, reminder_id)
    }

    #[test]
    fn notify_is_idempotent_per_due_date() {
        let (conn, reminder_id) = setup();
        assert_eq!(notify_overdue(&conn, at("2024-01-09")).expect("notify"), 0);
        assert_eq!(notify_overdue(&conn, at("2024-01-15")).expect("notify"), 1);
        assert_eq!(notify_overdue(&conn, at("2024-01-16")).expect("notify"), 0);

        complete_reminder(&conn, reminder_id, at("2024-01-16"), DriftPolicy::Anchored, None)
            .expect("complete");
        // next_due is now 2024-01-17; a fresh alert once that passes.
        assert_eq!(notify_overdue(&conn, at("2024-01-18")).expect("notify"), 1);

        let unread = unread_notifications(&conn, DEFAULT_UNREAD_LIMIT).expect("unread");
        assert_eq!(unread.len(), 2);
        assert_eq!(unread[0].due_at, at("2024-01-17"));
        assert!(unread[0].message.contains("Orchid"));
    }

    #[test]
    fn mark_read_is_idempotent_and_hides_from_unread() {
        let (conn, _) = setup();
        notify_overdue(&conn, at("2024-01-15")).expect("notify");
        let id = unread_notifications(&conn, 10).expect("unread")[0].notification_id;

        let first = mark_notification_read(&conn, id, at("2024-01-15T08:00:00Z")).expect("read");
        assert!(first.is_read);
        let second = mark_notification_read(&conn, id, at("2024-01-16")).expect("read");
        assert_eq!(second.read_at, Some(at("2024-01-15T08:00:00Z")));
        assert!(unread_notifications(&conn, 10).expect("unread").is_empty());
    }

    #[test]
    fn unknown_notification_is_not_found() {
        let (conn, _) = setup();
        let err = mark_notification_read(&conn, 31, at("2024-01-15")).expect_err("missing");
        assert!(err.is_not_found());
    }
}

//! Dashboard counters.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::error::Result;
use crate::model::status::PlantStatus;
use crate::time::{WEEK_US, to_us};

/// Store-wide counters as of one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_plants: u64,
    pub healthy_plants: u64,
    pub overdue_reminders: u64,
    pub unread_notifications: u64,
    pub events_this_week: u64,
}

/// Read all counters inside one read transaction so they describe a single
/// snapshot of the store.
///
/// `healthy_plants` counts plants whose status at `now` is healthy, so a past
/// `now` does not see later status events. `events_this_week` counts events
/// with `now - 168h < event_date <= now`. `total_plants` and
/// `unread_notifications` are current counts.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if any count fails.
pub fn dashboard_stats(conn: &Connection, now: DateTime<Utc>) -> Result<DashboardStats> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let now_us = to_us(now);

    let stats = DashboardStats {
        total_plants: count(&tx, "SELECT COUNT(*) FROM plants", params![])?,
        healthy_plants: count(
            &tx,
            "SELECT COUNT(*) FROM plants p WHERE (
                 SELECT e.status FROM events e
                 WHERE e.plant_id = p.plant_id AND e.status IS NOT NULL
                   AND e.event_date_us <= ?1
                 ORDER BY e.event_date_us DESC, e.event_id DESC
                 LIMIT 1
             ) = ?2",
            params![now_us, PlantStatus::Healthy.as_str()],
        )?,
        overdue_reminders: count(
            &tx,
            "SELECT COUNT(*) FROM reminders WHERE is_active = 1 AND next_due_us < ?1",
            params![now_us],
        )?,
        unread_notifications: count(
            &tx,
            "SELECT COUNT(*) FROM notifications WHERE is_read = 0",
            params![],
        )?,
        events_this_week: count(
            &tx,
            "SELECT COUNT(*) FROM events WHERE event_date_us > ?1 AND event_date_us <= ?2",
            params![now_us.saturating_sub(WEEK_US), now_us],
        )?,
    };
    tx.commit()?;

    tracing::debug!(?stats, %now, "computed dashboard stats");
    Ok(stats)
}

fn count(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(u64::try_from(n).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::event::{EventType, NewEvent};
    use crate::model::plant::NewPlant;
    use crate::model::reminder::{Frequency, NewReminder, ReminderType};
    use crate::records::{insert_plant, insert_reminder};
    use crate::store::append_event;
    use crate::time::parse_instant;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).expect("timestamp")
    }

    #[test]
    fn healthy_count_is_evaluated_at_now() {
        let conn = open_in_memory().expect("store");
        let plant_id = insert_plant(&conn, &NewPlant::named("Ivy"), at("2024-01-01")).expect("plant");
        for (status, date) in [
            (crate::PlantStatus::Healthy, "2024-02-01"),
            (crate::PlantStatus::Sick, "2024-03-01"),
        ] {
            append_event(&conn, &NewEvent::status_change(plant_id, status, at(date)), at(date))
                .expect("append");
        }

        assert_eq!(dashboard_stats(&conn, at("2024-01-15")).expect("stats").healthy_plants, 0);
        assert_eq!(dashboard_stats(&conn, at("2024-02-15")).expect("stats").healthy_plants, 1);
        assert_eq!(dashboard_stats(&conn, at("2024-03-15")).expect("stats").healthy_plants, 0);
    }

    #[test]
    fn empty_store_is_all_zero() {
        let conn = open_in_memory().expect("store");
        assert_eq!(
            dashboard_stats(&conn, at("2024-03-01")).expect("stats"),
            DashboardStats::default()
        );
    }

    #[test]
    fn counts_reflect_store_contents() {
        let conn = open_in_memory().expect("store");
        let now = at("2024-03-01T12:00:00Z");
        let a = insert_plant(&conn, &NewPlant::named("Aloe"), now).expect("plant");
        let b = insert_plant(&conn, &NewPlant::named("Basil"), now).expect("plant");
        insert_plant(&conn, &NewPlant::named("Cactus"), now).expect("plant");

        append_event(
            &conn,
            &NewEvent::status_change(a, crate::PlantStatus::Healthy, at("2024-02-01")),
            now,
        )
        .expect("append");
        append_event(&conn, &NewEvent::new(b, EventType::PestObserved, at("2024-02-28")), now)
            .expect("append");
        // Exactly 168h before now: outside the window.
        append_event(
            &conn,
            &NewEvent::new(b, EventType::Watering, at("2024-02-23T12:00:00Z")),
            now,
        )
        .expect("append");
        // In the future: outside the window.
        append_event(&conn, &NewEvent::new(b, EventType::Watering, at("2024-03-02")), now)
            .expect("append");

        insert_reminder(
            &conn,
            &NewReminder {
                plant_id: a,
                reminder_type: ReminderType::Watering,
                frequency: Frequency::days(7).expect("freq"),
                next_due: Some(at("2024-02-25")),
            },
            now,
        )
        .expect("reminder");

        let stats = dashboard_stats(&conn, now).expect("stats");
        assert_eq!(
            stats,
            DashboardStats {
                total_plants: 3,
                healthy_plants: 1,
                overdue_reminders: 1,
                unread_notifications: 0,
                events_this_week: 1,
            }
        );
    }
}

//! Dated end-to-end scenarios against a file-backed store.

use leaflog_core::db::{open_store, try_open_store};
use leaflog_core::history::history;
use leaflog_core::notify::{notify_overdue, unread_notifications};
use leaflog_core::records::{insert_plant, insert_reminder, require_plant};
use leaflog_core::report::plant_report;
use leaflog_core::scheduler::overdue_reminders;
use leaflog_core::status::{rebuild_status_cache, verify_status_cache};
use leaflog_core::time::{parse_date, parse_instant};
use leaflog_core::{
    DriftPolicy, EventType, Frequency, NewEvent, NewPlant, NewReminder, PlantStatus,
    ReminderType, StatusTransition, append_event, complete_reminder, dashboard_stats, is_overdue,
    status_at,
};
use chrono::{DateTime, Utc};
use tempfile::TempDir;

fn at(raw: &str) -> DateTime<Utc> {
    parse_instant(raw).expect("timestamp")
}

fn temp_store() -> (TempDir, rusqlite::Connection) {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = open_store(&dir.path().join(".leaflog").join("leaflog.db")).expect("open store");
    (dir, conn)
}

#[test]
fn plant_without_events_is_unknown() {
    let (_dir, conn) = temp_store();
    let plant_id = insert_plant(
        &conn,
        &NewPlant::named("Monstera").planted_on(parse_date("2024-01-01").expect("date")),
        at("2024-01-01"),
    )
    .expect("plant");

    for probe in ["2024-01-01", "2024-06-01"] {
        assert_eq!(
            status_at(&conn, plant_id, at(probe)).expect("status"),
            PlantStatus::Unknown,
            "{probe}"
        );
    }
}

#[test]
fn status_change_takes_effect_at_its_date() {
    let (_dir, conn) = temp_store();
    let plant_id = insert_plant(
        &conn,
        &NewPlant::named("Monstera").planted_on(parse_date("2024-01-01").expect("date")),
        at("2024-01-01"),
    )
    .expect("plant");
    append_event(
        &conn,
        &NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
        at("2024-02-01"),
    )
    .expect("append");

    assert_eq!(
        status_at(&conn, plant_id, at("2024-01-15")).expect("status"),
        PlantStatus::Unknown
    );
    assert_eq!(
        status_at(&conn, plant_id, at("2024-03-01")).expect("status"),
        PlantStatus::Healthy
    );
    assert_eq!(
        history(&conn, plant_id, at("2024-01-01"), at("2024-03-01")).expect("history"),
        vec![
            StatusTransition {
                at: at("2024-01-01"),
                status: PlantStatus::Unknown,
            },
            StatusTransition {
                at: at("2024-02-01"),
                status: PlantStatus::Healthy,
            },
        ]
    );
}

#[test]
fn weekly_reminder_is_overdue_after_due_date() {
    let (_dir, conn) = temp_store();
    let plant_id = insert_plant(&conn, &NewPlant::named("Fern"), at("2024-01-01")).expect("plant");
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

    let now = at("2024-01-15");
    let overdue = overdue_reminders(&conn, now).expect("overdue");
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].reminder_id, reminder_id);
    assert!(is_overdue(&overdue[0], now));
    assert_eq!(dashboard_stats(&conn, now).expect("stats").overdue_reminders, 1);
}

#[test]
fn care_cycle_from_reminder_to_report() {
    let (_dir, conn) = temp_store();
    let plant_id = insert_plant(
        &conn,
        &NewPlant::named("Calathea").planted_on(parse_date("2024-01-01").expect("date")),
        at("2024-01-01"),
    )
    .expect("plant");
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

    assert_eq!(notify_overdue(&conn, at("2024-01-15")).expect("notify"), 1);
    let completion =
        complete_reminder(&conn, reminder_id, at("2024-01-15"), DriftPolicy::Anchored, None)
            .expect("complete");
    assert_eq!(completion.next_due, at("2024-01-17"));

    append_event(
        &conn,
        &NewEvent::new(plant_id, EventType::PestObserved, at("2024-01-16")),
        at("2024-01-16"),
    )
    .expect("append");

    let report = plant_report(&conn, plant_id, at("2024-01-16T12:00:00Z")).expect("report");
    assert_eq!(report.status, PlantStatus::NeedsAttention);
    assert_eq!(report.last_watering, Some(at("2024-01-15")));
    assert_eq!(report.total_events, 2);
    assert_eq!(report.overdue_reminders, 0);
    assert_eq!(report.days_since_planting, 15);

    let unread = unread_notifications(&conn, 20).expect("unread");
    assert_eq!(unread.len(), 1);
}

#[test]
fn status_cache_survives_reopen_and_rebuild() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(".leaflog").join("leaflog.db");
    let plant_id = {
        let conn = open_store(&path).expect("open");
        let plant_id =
            insert_plant(&conn, &NewPlant::named("Ivy"), at("2024-01-01")).expect("plant");
        append_event(
            &conn,
            &NewEvent::new(plant_id, EventType::Death, at("2024-04-01")),
            at("2024-04-01"),
        )
        .expect("append");
        plant_id
    };

    let conn = try_open_store(&path).expect("open").expect("store exists");
    assert_eq!(
        require_plant(&conn, plant_id).expect("plant").current_status,
        PlantStatus::Dead
    );
    assert!(verify_status_cache(&conn).expect("verify").is_empty());
    assert_eq!(rebuild_status_cache(&conn, at("2024-05-01")).expect("rebuild"), 0);
}

#[test]
fn second_connection_sees_committed_appends() {
    let (dir, conn) = temp_store();
    let plant_id = insert_plant(&conn, &NewPlant::named("Basil"), at("2024-01-01")).expect("plant");

    let other = open_store(&dir.path().join(".leaflog").join("leaflog.db")).expect("second handle");
    append_event(
        &other,
        &NewEvent::status_change(plant_id, PlantStatus::Healthy, at("2024-02-01")),
        at("2024-02-01"),
    )
    .expect("append via second handle");

    assert_eq!(
        status_at(&conn, plant_id, at("2024-02-02")).expect("status"),
        PlantStatus::Healthy
    );
}

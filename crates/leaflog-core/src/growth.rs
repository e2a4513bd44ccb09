//! Growth trend aggregation over a trailing window.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::model::measurement::MeasurementSample;
use crate::records::{MEASUREMENT_COLUMNS, ensure_plant_exists, row_to_measurement};
use crate::time::{to_us, window_start_us};

/// Measurements with `now - days <= taken_at <= now`, oldest first.
///
/// `days <= 0` yields an empty trend without touching the store.
///
/// # Errors
///
/// Returns [`crate::LeafError::NotFound`] if the plant does not exist.
pub fn growth_trend(
    conn: &Connection,
    plant_id: i64,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<MeasurementSample>> {
    if days <= 0 {
        return Ok(Vec::new());
    }
    ensure_plant_exists(conn, plant_id)?;

    let now_us = to_us(now);
    let sql = format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM growth_measurements
         WHERE plant_id = ?1 AND taken_at_us >= ?2 AND taken_at_us <= ?3
         ORDER BY taken_at_us ASC, measurement_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![plant_id, window_start_us(now_us, days), now_us],
        row_to_measurement,
    )?;
    let samples = rows.collect::<rusqlite::Result<Vec<_>>>()?;

    tracing::debug!(plant_id, days, samples = samples.len(), "built growth trend");
    Ok(samples)
}

/// Most recent measurement taken at or before `now`.
///
/// # Errors
///
/// Returns [`crate::LeafError::Storage`] if the query fails.
pub fn latest_measurement(
    conn: &Connection,
    plant_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<MeasurementSample>> {
    let sql = format!(
        "SELECT {MEASUREMENT_COLUMNS} FROM growth_measurements
         WHERE plant_id = ?1 AND taken_at_us <= ?2
         ORDER BY taken_at_us DESC, measurement_id DESC
         LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![plant_id, to_us(now)], row_to_measurement)
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::model::measurement::NewMeasurement;
    use crate::model::plant::NewPlant;
    use crate::records::insert_plant;
    use crate::store::append_measurement;
    use crate::time::parse_instant;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).expect("timestamp")
    }

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().expect("store");
        let plant_id =
            insert_plant(&conn, &NewPlant::named("Pilea"), at("2024-01-01")).expect("plant");
        for (day, height) in [
            ("2024-01-05", 10.0),
            ("2024-02-01", 12.5),
            ("2024-02-20", 13.0),
            ("2024-03-10", 15.0),
        ] {
            append_measurement(&conn, &NewMeasurement::new(plant_id, at(day)).height(height))
                .expect("measure");
        }
        append_measurement(&conn, &NewMeasurement::new(plant_id, at("2024-02-25")).leaves(9))
            .expect("measure");
        (conn, plant_id)
    }

    #[test]
    fn window_is_inclusive_and_ascending() {
        let (conn, plant_id) = setup();
        // 2024-03-01 minus 29 days lands exactly on 2024-02-01.
        let samples = growth_trend(&conn, plant_id, 29, at("2024-03-01")).expect("trend");
        let dates: Vec<_> = samples.iter().map(|s| s.taken_at).collect();
        assert_eq!(dates, vec![at("2024-02-01"), at("2024-02-20"), at("2024-02-25")]);
    }

    #[test]
    fn absent_metrics_stay_absent() {
        let (conn, plant_id) = setup();
        let samples = growth_trend(&conn, plant_id, 30, at("2024-03-01")).expect("trend");
        let leafy = samples.iter().find(|s| s.leaf_count.is_some()).expect("leaf sample");
        assert_eq!(leafy.height_cm, None);
        assert_eq!(leafy.leaf_count, Some(9));
    }

    #[test]
    fn non_positive_days_is_empty() {
        let (conn, plant_id) = setup();
        assert!(growth_trend(&conn, plant_id, 0, at("2024-03-01")).expect("trend").is_empty());
        assert!(growth_trend(&conn, plant_id, -5, at("2024-03-01")).expect("trend").is_empty());
        // Checked before the plant lookup.
        assert!(growth_trend(&conn, 999, 0, at("2024-03-01")).expect("trend").is_empty());
    }

    #[test]
    fn missing_plant_is_not_found() {
        let (conn, _) = setup();
        assert!(growth_trend(&conn, 999, 30, at("2024-03-01"))
            .expect_err("missing")
            .is_not_found());
    }

    #[test]
    fn latest_ignores_future_samples() {
        let (conn, plant_id) = setup();
        let latest = latest_measurement(&conn, plant_id, at("2024-03-01"))
            .expect("query")
            .expect("sample");
        assert_eq!(latest.taken_at, at("2024-02-25"));
    }
}

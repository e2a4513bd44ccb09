use chrono::Duration;
use leaflog_core::dashboard::dashboard_stats;
use leaflog_core::history::{history, replay, transitions_from_log};
use leaflog_core::status::status_from_log;
use leaflog_core::store::append_measurement;
use leaflog_core::time::WEEK_US;
use leaflog_core::{EventFilter, NewMeasurement, append_event, growth_trend, query_events, status_at};
use proptest::prelude::*;

use generators::*;

proptest! {
    // Each case builds a SQLite store; keep the count modest.
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn store_status_matches_log_rule(seeds in arb_log(40), probe in 0..SPAN_HOURS + 48) {
        let (conn, plant_id) = seeded_store(&seeds);
        let events = query_events(&conn, plant_id, &EventFilter::default()).expect("events");
        let at = hour(probe);
        prop_assert_eq!(status_at(&conn, plant_id, at).expect("status"), status_from_log(&events, at));
    }

    #[test]
    fn status_is_stable_between_status_events(seeds in arb_log(40), t1 in 0..SPAN_HOURS, gap in 0..(24 * 30_i64)) {
        let (conn, plant_id) = seeded_store(&seeds);
        let events = query_events(&conn, plant_id, &EventFilter::default()).expect("events");

        let t1 = hour(t1);
        // Stop just before the next status-relevant event after t1, if any.
        let next_change = events
            .iter()
            .filter(|e| e.status.is_some() && e.event_date > t1)
            .map(|e| e.event_date)
            .min();
        let mut t2 = t1 + Duration::hours(gap);
        if let Some(next) = next_change {
            if t2 >= next {
                t2 = next - Duration::microseconds(1);
            }
        }
        prop_assume!(t2 >= t1);

        prop_assert_eq!(
            status_at(&conn, plant_id, t1).expect("status"),
            status_at(&conn, plant_id, t2).expect("status")
        );
    }

    #[test]
    fn history_replay_reproduces_status_at(
        seeds in arb_log(40),
        from in 0..SPAN_HOURS,
        len in 0..SPAN_HOURS,
        probes in prop::collection::vec(0..SPAN_HOURS, 1..12),
    ) {
        let (conn, plant_id) = seeded_store(&seeds);
        let from = hour(from);
        let to = from + Duration::hours(len);
        let transitions = history(&conn, plant_id, from, to).expect("history");

        prop_assert!(!transitions.is_empty());
        prop_assert_eq!(transitions[0].at, from);
        for pair in transitions.windows(2) {
            prop_assert!(pair[0].at < pair[1].at);
            prop_assert_ne!(pair[0].status, pair[1].status);
        }
        for t in &transitions[1..] {
            prop_assert_eq!(status_at(&conn, plant_id, t.at).expect("status"), t.status);
        }

        for probe in probes {
            let at = from + Duration::hours(probe % (len + 1));
            prop_assert_eq!(
                replay(&transitions, at),
                Some(status_at(&conn, plant_id, at).expect("status"))
            );
        }

        let events = query_events(&conn, plant_id, &EventFilter::default()).expect("events");
        prop_assert_eq!(transitions_from_log(&events, from, to).expect("log history"), transitions);
    }

    #[test]
    fn appending_never_rewrites_the_past(
        seeds in arb_log(30),
        extra in arb_event_seed(),
        probes in prop::collection::vec(0..SPAN_HOURS, 1..12),
    ) {
        let (conn, plant_id) = seeded_store(&seeds);
        let before: Vec<_> = probes
            .iter()
            .map(|p| status_at(&conn, plant_id, hour(*p)).expect("status"))
            .collect();

        let event = extra.to_new_event(plant_id);
        append_event(&conn, &event, event.event_date).expect("append");

        for (probe, prior) in probes.iter().zip(before) {
            let at = hour(*probe);
            if at < event.event_date {
                prop_assert_eq!(status_at(&conn, plant_id, at).expect("status"), prior);
            }
        }
    }

    #[test]
    fn growth_trend_stays_inside_window(
        samples in prop::collection::vec((0..SPAN_HOURS, 0.0..200.0_f64), 0..25),
        days in -3_i64..60,
        now in 0..SPAN_HOURS,
    ) {
        let (conn, plant_id) = store_with_plant();
        for (h, height) in &samples {
            append_measurement(&conn, &NewMeasurement::new(plant_id, hour(*h)).height(*height))
                .expect("measure");
        }
        let now = hour(now);
        let trend = growth_trend(&conn, plant_id, days, now).expect("trend");

        if days <= 0 {
            prop_assert!(trend.is_empty());
        } else {
            let start = now - Duration::days(days);
            let expected = samples
                .iter()
                .filter(|(h, _)| hour(*h) >= start && hour(*h) <= now)
                .count();
            prop_assert_eq!(trend.len(), expected);
            prop_assert!(trend.iter().all(|s| s.taken_at >= start && s.taken_at <= now));
            prop_assert!(trend.windows(2).all(|w| w[0].taken_at <= w[1].taken_at));
        }
    }

    #[test]
    fn events_this_week_is_trailing_168_hours(seeds in arb_log(40), now in 0..SPAN_HOURS) {
        let (conn, _) = seeded_store(&seeds);
        let now = hour(now);
        let window_start = now - Duration::microseconds(WEEK_US);
        let expected = seeds
            .iter()
            .filter(|s| hour(s.hour) > window_start && hour(s.hour) <= now)
            .count();
        let stats = dashboard_stats(&conn, now).expect("stats");
        prop_assert_eq!(stats.events_this_week, u64::try_from(expected).expect("count"));
    }
}

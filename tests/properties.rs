//! Property-based tests for validation and analytics invariants.
//!
//! Random batches of events are pushed through the full pipeline against an
//! in-memory store, then the persisted facts and derived KPIs are checked.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use linecycle_core::analytics::Analytics;
use linecycle_core::event::{format_timestamp, ProductionEvent, Status};
use linecycle_core::pipeline::{process_batch, BatchResult, RunContext};
use linecycle_core::storage::{FactStore, MemoryStore};

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap()
}

/// Generates a line id from a small pool so lines get several events.
fn arb_line() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["gr-np-47", "gr-np-48", "bk-01"]).prop_map(String::from)
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop::sample::select(Status::ALL.to_vec())
}

/// Generates one input row as (line, status, seconds after base time).
fn arb_row() -> impl Strategy<Value = (String, Status, i64)> {
    (arb_line(), arb_status(), 0i64..7_200)
}

fn arb_batch() -> impl Strategy<Value = Vec<(String, Status, i64)>> {
    prop::collection::vec(arb_row(), 0..60)
}

fn to_csv(rows: &[(String, Status, i64)]) -> String {
    let mut out = String::from("production_line_id,status,timestamp\n");
    for (line, status, offset) in rows {
        let ts = base_time() + Duration::seconds(*offset);
        out.push_str(&format!("{},{},{}\n", line, status, format_timestamp(&ts)));
    }
    out
}

fn load(store: &mut MemoryStore, input: &str) -> BatchResult {
    process_batch(&RunContext::new(), store, input).unwrap()
}

fn fresh_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.ensure_schema().unwrap();
    store
}

fn by_line(events: Vec<ProductionEvent>) -> BTreeMap<String, Vec<ProductionEvent>> {
    let mut map: BTreeMap<String, Vec<ProductionEvent>> = BTreeMap::new();
    for event in events {
        map.entry(event.line_id.clone()).or_default().push(event);
    }
    for events in map.values_mut() {
        events.sort_by_key(|e| e.event_time);
    }
    map
}

proptest! {
    #[test]
    fn prop_every_row_lands_somewhere(rows in arb_batch()) {
        let mut store = fresh_store();
        let result = load(&mut store, &to_csv(&rows));

        prop_assert_eq!(result.received_count, rows.len());
        prop_assert_eq!(
            result.accepted_count + result.resubmitted_count + result.quarantined_count(),
            rows.len()
        );
        prop_assert_eq!(store.fact_count(), result.accepted_count);
    }

    #[test]
    fn prop_accepted_events_follow_lifecycle(rows in arb_batch()) {
        let mut store = fresh_store();
        load(&mut store, &to_csv(&rows));

        for (line, events) in by_line(store.events().unwrap()) {
            let mut previous: Option<&ProductionEvent> = None;
            for event in &events {
                let allowed = match previous.map(|p| p.status) {
                    None | Some(Status::Stop) => event.status == Status::Start,
                    Some(Status::Start) | Some(Status::On) => {
                        matches!(event.status, Status::On | Status::Stop)
                    }
                };
                prop_assert!(allowed, "line {} broke lifecycle at {:?}", line, event);
                if let Some(p) = previous {
                    prop_assert!(p.event_time < event.event_time);
                }
                previous = Some(event);
            }
        }
    }

    #[test]
    fn prop_rerun_is_idempotent(rows in arb_batch()) {
        let input = to_csv(&rows);
        let mut store = fresh_store();
        let first = load(&mut store, &input);
        let facts = store.events().unwrap();
        let summary = Analytics::from_store(&store).unwrap().floor_summary();

        let second = load(&mut store, &input);
        prop_assert_eq!(second.load.inserted, 0);
        prop_assert_eq!(second.resubmitted_count, first.accepted_count);
        prop_assert_eq!(store.events().unwrap(), facts);
        prop_assert_eq!(Analytics::from_store(&store).unwrap().floor_summary(), summary);
    }

    #[test]
    fn prop_uptime_plus_downtime_spans_line(rows in arb_batch()) {
        let mut store = fresh_store();
        load(&mut store, &to_csv(&rows));
        let summary = Analytics::from_store(&store).unwrap().floor_summary();

        for (line, events) in by_line(store.events().unwrap()) {
            let totals = summary.line(&line).unwrap();
            let span = match (events.first(), events.last()) {
                (Some(first), Some(last)) => (last.event_time - first.event_time).num_seconds(),
                _ => 0,
            };
            prop_assert!(totals.uptime_secs >= 0);
            prop_assert!(totals.downtime_secs >= 0);
            prop_assert_eq!(totals.uptime_secs + totals.downtime_secs, span);
        }
        prop_assert_eq!(
            summary.total_uptime_secs,
            summary.per_line.iter().map(|t| t.uptime_secs).sum::<i64>()
        );
    }

    #[test]
    fn prop_cycle_durations_are_positive(rows in arb_batch()) {
        let mut store = fresh_store();
        load(&mut store, &to_csv(&rows));
        let analytics = Analytics::from_store(&store).unwrap();

        for derivation in analytics.derivations() {
            let open = derivation.cycles.iter().filter(|c| c.is_open()).count();
            prop_assert!(open <= 1);
            for cycle in &derivation.cycles {
                match (cycle.stop, cycle.duration_secs) {
                    (Some(stop), Some(secs)) => {
                        prop_assert!(secs > 0);
                        prop_assert_eq!((stop - cycle.start).num_seconds(), secs);
                    }
                    (None, None) => {}
                    other => prop_assert!(false, "inconsistent cycle {:?}", other),
                }
            }
        }
    }

    #[test]
    fn prop_worst_line_has_max_downtime(rows in arb_batch()) {
        let mut store = fresh_store();
        load(&mut store, &to_csv(&rows));
        let analytics = Analytics::from_store(&store).unwrap();
        let summary = analytics.floor_summary();

        match analytics.worst_downtime_line() {
            Some(worst) => {
                for totals in &summary.per_line {
                    prop_assert!(worst.downtime_secs >= totals.downtime_secs);
                    if totals.downtime_secs == worst.downtime_secs {
                        prop_assert!(worst.line_id <= totals.line_id);
                    }
                }
            }
            None => prop_assert!(summary.per_line.is_empty()),
        }
    }
}

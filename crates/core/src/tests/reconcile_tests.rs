// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    NOW, RecordingNotifier, employee, pair, records, run, run_with, source, window,
};
use crate::{
    CancellationFlag, CoreError, EmployeePunchPairs, EngineConfig, InMemoryStore, PunchSource,
    ReconciliationContext, ReconciliationReport, ReconciliationStore, SourceError, reconcile,
};
use time::{Duration, OffsetDateTime};
use time::macros::datetime;
use timeclock_domain::{Component, DomainError, EmployeeId, LayoutConfig, Shift, ShiftState};

#[test]
fn test_reconciling_twice_is_idempotent() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![
        records(
            "1",
            vec![
                pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T12:00:00Z")),
                pair(3, "2026-03-02T12:30:00Z", Some("2026-03-02T17:00:00Z")),
            ],
        ),
        records("2", vec![pair(5, "2026-03-03T08:00:00Z", None)]),
    ]);

    let first: ReconciliationReport = run(&mut store, &src).unwrap();
    assert_eq!(first.components_created, 2);
    assert_eq!(first.components_appended, 1);
    let shifts: Vec<Shift> = store.shifts();

    let second: ReconciliationReport = run(&mut store, &src).unwrap();
    assert_eq!(second.components_unchanged, 3);
    assert_eq!(second.rows_written, 0);
    assert!(second.duplicates_removed.is_empty());
    assert!(second.delta.is_empty());
    assert_eq!(store.shifts(), shifts);
}

#[test]
fn test_overnight_naive_punches() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![records(
        "1",
        vec![pair(1, "2026-03-02 23:30:00", Some("2026-03-03 00:15:00"))],
    )]);
    run(&mut store, &src).unwrap();

    let shifts: Vec<Shift> = store.shifts();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].duration(), Duration::minutes(45));
    assert_eq!(shifts[0].start(), datetime!(2026-03-03 04:30 UTC));
}

#[test]
fn test_late_close_completes_existing_shift() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let mut src = source(vec![records(
        "1",
        vec![pair(1, "2026-03-02T09:00:00Z", None)],
    )]);
    let first = run(&mut store, &src).unwrap();
    assert_eq!(first.record.shifts().len(), 1);
    assert_eq!(store.shifts()[0].state(), ShiftState::Incomplete);
    assert_eq!(store.shifts()[0].duration(), Duration::ZERO);

    src.set_records(vec![records(
        "1",
        vec![pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
    )]);
    let second = run(&mut store, &src).unwrap();

    assert_eq!(second.components_refreshed, 1);
    assert_eq!(second.delta.clocked_out, vec![employee("1")]);
    let shifts: Vec<Shift> = store.shifts();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].state(), ShiftState::Complete);
    assert_eq!(shifts[0].duration(), Duration::hours(8));
}

#[test]
fn test_reimported_open_duplicate_is_removed() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let mut src = source(vec![records(
        "1",
        vec![pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
    )]);
    run(&mut store, &src).unwrap();

    src.set_records(vec![records(
        "1",
        vec![
            pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z")),
            pair(9, "2026-03-02T09:30:00Z", None),
        ],
    )]);
    let report = run(&mut store, &src).unwrap();

    assert_eq!(report.duplicates_removed, vec![2]);
    assert!(report.record.shifts().is_empty());
    let shifts: Vec<Shift> = store.shifts();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].state(), ShiftState::Complete);
}

fn daily_chunks() -> EngineConfig {
    EngineConfig {
        fetch_chunk: Duration::days(1),
        ..EngineConfig::default()
    }
}

#[test]
fn test_split_record_seen_collapsed_later_is_counted_once() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![records(
        "1",
        vec![
            pair(1, "2026-03-02T22:00:00Z", Some("2026-03-03T00:00:00Z")),
            pair(3, "2026-03-03T00:00:00Z", Some("2026-03-03T06:00:00Z")),
        ],
    )]);

    // The halves land in different chunks and are stored separately.
    let first = run_with(&mut store, &src, daily_chunks(), CancellationFlag::new()).unwrap();
    assert_eq!(first.components_created, 1);
    assert_eq!(first.components_appended, 1);
    assert_eq!(store.shifts()[0].duration(), Duration::hours(8));

    // Fetched together they collapse into one wider component.
    let second = run(&mut store, &src).unwrap();
    assert_eq!(second.components_refreshed, 1);
    let shifts: Vec<Shift> = store.shifts();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].duration(), Duration::hours(8));
    assert_eq!(shifts[0].component_ids().len(), 1);
    assert_eq!(store.components().len(), 1);
    assert_eq!(store.components()[0].punches(), &[1, 2, 3, 4]);

    let third = run_with(&mut store, &src, daily_chunks(), CancellationFlag::new()).unwrap();
    assert!(third.duplicates_removed.is_empty());
    let shifts: Vec<Shift> = store.shifts();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].duration(), Duration::hours(8));
    assert_eq!(shifts[0].end(), Some(datetime!(2026-03-03 06:00 UTC)));
}

#[test]
fn test_forgotten_clock_out_survives_repeated_runs() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![records(
        "1",
        vec![
            pair(1, "2026-03-01T09:00:00Z", None),
            pair(3, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z")),
        ],
    )]);

    let first = run(&mut store, &src).unwrap();
    assert!(first.duplicates_removed.is_empty());
    let shifts: Vec<Shift> = store.shifts();

    let second = run(&mut store, &src).unwrap();
    assert!(second.duplicates_removed.is_empty());
    assert_eq!(second.components_unchanged, 2);
    assert_eq!(store.shifts(), shifts);

    let starts: Vec<(OffsetDateTime, ShiftState)> =
        shifts.iter().map(|s| (s.start(), s.state())).collect();
    assert_eq!(
        starts,
        vec![
            (datetime!(2026-03-01 09:00 UTC), ShiftState::Incomplete),
            (datetime!(2026-03-02 09:00 UTC), ShiftState::Complete),
        ]
    );
    assert_eq!(second.record.shifts().len(), 1);
}

#[test]
fn test_undated_record_is_reported_once_per_run() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let mut undated = pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"));
    undated.start_punch = None;
    let src = source(vec![records("1", vec![undated])]);

    let report = run_with(&mut store, &src, daily_chunks(), CancellationFlag::new()).unwrap();
    assert_eq!(report.rejected_records, 1);
    assert!(store.components().is_empty());
}

#[test]
fn test_rows_follow_start_order_and_reuse_lanes() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![
        records(
            "1",
            vec![pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
        ),
        records(
            "2",
            vec![pair(3, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
        ),
        records(
            "3",
            vec![pair(5, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
        ),
        records(
            "4",
            vec![pair(7, "2026-03-02T17:00:00Z", Some("2026-03-02T21:00:00Z"))],
        ),
    ]);
    let report = run(&mut store, &src).unwrap();

    assert_eq!(report.rows_written, 4);
    let rows: Vec<(String, Option<u16>)> = store
        .shifts()
        .iter()
        .map(|s| (s.employee().to_string(), s.row()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (String::from("1"), Some(0)),
            (String::from("2"), Some(1)),
            (String::from("3"), Some(2)),
            (String::from("4"), Some(0)),
        ]
    );
}

#[test]
fn test_live_state_holds_only_clocked_in_employees() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![
        records("A", vec![pair(1, "2026-03-03T08:00:00Z", None)]),
        records(
            "B",
            vec![pair(3, "2026-03-03T08:00:00Z", Some("2026-03-03T16:00:00Z"))],
        ),
    ]);
    let notifier: RecordingNotifier = RecordingNotifier::default();
    let mut ctx = ReconciliationContext::new(
        &mut store,
        EngineConfig::default(),
        CancellationFlag::new(),
    )
    .unwrap();
    let report = reconcile(&mut ctx, &src, &notifier, window(), NOW).unwrap();
    assert_eq!(ctx.previous(), Some(&report.record));

    let employees: Vec<EmployeeId> = report
        .record
        .shifts()
        .iter()
        .map(|s| s.employee().clone())
        .collect();
    assert_eq!(employees, vec![employee("A")]);
    assert_eq!(report.record.record_id(), Some(1));

    let calls = notifier.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, report.record);
    assert_eq!(calls[0].1.clocked_in, vec![employee("A")]);
    drop(calls);

    assert_eq!(store.live_states().len(), 1);
    assert_eq!(store.syncs(), &[NOW]);
}

#[test]
fn test_malformed_records_are_counted_and_skipped() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let mut broken = pair(1, "2026-03-02T09:00:00Z", None);
    broken.start_punch = None;
    let src = source(vec![records(
        "1",
        vec![
            broken,
            pair(3, "2026-03-02T09:00:00Z", Some("2026-03-02T08:00:00Z")),
            pair(5, "2026-03-02T10:00:00Z", None),
        ],
    )]);

    let report = run(&mut store, &src).unwrap();
    assert_eq!(report.rejected_records, 2);
    assert_eq!(report.components_created, 1);
}

#[test]
fn test_orphaned_component_aborts_without_live_state() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let orphan: Component = Component::new(
        employee("1"),
        datetime!(2026-03-02 09:00 UTC),
        None,
        vec![1],
        false,
    )
    .unwrap()
    .with_shift(Some(99));
    store.insert_component(&orphan).unwrap();

    let src = source(vec![records(
        "1",
        vec![pair(1, "2026-03-02T09:00:00Z", Some("2026-03-02T17:00:00Z"))],
    )]);
    let err = run(&mut store, &src).unwrap_err();

    assert!(matches!(err, CoreError::OrphanedComponent { shift_id: 99, .. }));
    assert!(!err.is_transient());
    assert!(store.live_states().is_empty());
    assert!(store.syncs().is_empty());
}

#[test]
fn test_cancelled_run_appends_nothing() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(vec![records(
        "1",
        vec![pair(1, "2026-03-02T09:00:00Z", None)],
    )]);
    let cancellation: CancellationFlag = CancellationFlag::new();
    cancellation.cancel();

    let err = run_with(&mut store, &src, EngineConfig::default(), cancellation).unwrap_err();
    assert_eq!(err, CoreError::Cancelled);
    assert!(store.shifts().is_empty());
    assert!(store.live_states().is_empty());
    assert!(store.syncs().is_empty());
}

#[test]
fn test_lane_cap_exceeded_fails_the_run() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let src = source(
        ["1", "2", "3"]
            .iter()
            .enumerate()
            .map(|(i, id)| {
                records(
                    id,
                    vec![pair(
                        i64::try_from(i).unwrap() * 2,
                        "2026-03-02T09:00:00Z",
                        Some("2026-03-02T17:00:00Z"),
                    )],
                )
            })
            .collect(),
    );
    let config: EngineConfig = EngineConfig {
        layout: LayoutConfig {
            lane_cap: 2,
            ..LayoutConfig::default()
        },
        ..EngineConfig::default()
    };

    let err = run_with(&mut store, &src, config, CancellationFlag::new()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::DomainViolation(DomainError::LaneCapacityExceeded { cap: 2, .. })
    ));
    assert!(store.live_states().is_empty());
}

struct UnreachableSource;

impl PunchSource for UnreachableSource {
    fn employee_ids(&self) -> Result<Vec<EmployeeId>, SourceError> {
        Err(SourceError::Unavailable(String::from("connection refused")))
    }

    fn fetch_punches(
        &self,
        _employees: &[EmployeeId],
        _start: OffsetDateTime,
        _end: OffsetDateTime,
    ) -> Result<Vec<EmployeePunchPairs>, SourceError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_unreachable_source_is_transient_and_keeps_checkpoint() {
    let mut store: InMemoryStore = InMemoryStore::new();
    store.record_sync(datetime!(2026-03-01 00:00 UTC)).unwrap();
    let notifier: RecordingNotifier = RecordingNotifier::default();
    let mut ctx = ReconciliationContext::new(
        &mut store,
        EngineConfig::default(),
        CancellationFlag::new(),
    )
    .unwrap();

    let err = reconcile(&mut ctx, &UnreachableSource, &notifier, window(), NOW).unwrap_err();
    assert!(err.is_transient());
    assert!(notifier.calls.borrow().is_empty());
    assert_eq!(store.syncs(), &[datetime!(2026-03-01 00:00 UTC)]);
}

#[test]
fn test_scheduled_window_uses_checkpoint() {
    let mut store: InMemoryStore = InMemoryStore::new();
    let mut ctx = ReconciliationContext::new(
        &mut store,
        EngineConfig::default(),
        CancellationFlag::new(),
    )
    .unwrap();
    let first = ctx.scheduled_window(NOW).unwrap();
    assert_eq!(first.start(), NOW - Duration::days(365));

    let src = source(vec![]);
    reconcile(&mut ctx, &src, &RecordingNotifier::default(), first, NOW).unwrap();
    let next = ctx.scheduled_window(NOW + Duration::hours(1)).unwrap();
    // 2026-03-04 00:00 UTC is Tuesday evening in New York.
    assert_eq!(next.start(), datetime!(2026-03-01 05:00 UTC));
}

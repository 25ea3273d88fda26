// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{component, employee, shift};
use crate::{DomainError, LiveStateDelta, LiveStateRecord, Shift, compute_live_state};
use time::OffsetDateTime;
use time::macros::datetime;

const NOW: OffsetDateTime = datetime!(2026-03-02 18:00 UTC);

fn open(id: i64, employee_id: &str, start: OffsetDateTime) -> Shift {
    shift(id, &[component(id, employee_id, start, None)])
}

#[test]
fn test_only_open_shifts_are_live() {
    let a: Shift = open(1, "A", datetime!(2026-03-02 08:00 UTC));
    let b: Shift = shift(
        2,
        &[component(
            2,
            "B",
            datetime!(2026-03-02 08:00 UTC),
            Some(datetime!(2026-03-02 16:00 UTC)),
        )],
    );

    let record: LiveStateRecord = compute_live_state(&[a, b], &[], NOW).unwrap();
    assert_eq!(record.shifts().len(), 1);
    assert!(record.shift_for(&employee("A")).is_some());
    assert!(record.shift_for(&employee("B")).is_none());
}

#[test]
fn test_most_recent_open_shift_per_employee_wins() {
    let stale: Shift = open(1, "A", datetime!(2026-02-20 08:00 UTC));
    let fresh: Shift = open(2, "A", datetime!(2026-03-02 08:00 UTC));

    let record: LiveStateRecord = compute_live_state(&[fresh, stale], &[], NOW).unwrap();
    assert_eq!(
        record.shift_for(&employee("A")).unwrap().shift_id(),
        Some(2)
    );
}

#[test]
fn test_still_open_previous_shift_is_carried_forward() {
    let carried: Shift = open(5, "C", datetime!(2026-03-02 07:00 UTC));
    let closed: Shift = shift(
        6,
        &[component(
            6,
            "D",
            datetime!(2026-03-02 07:00 UTC),
            Some(datetime!(2026-03-02 15:00 UTC)),
        )],
    );

    let record: LiveStateRecord = compute_live_state(&[], &[carried, closed], NOW).unwrap();
    let employees: Vec<String> = record.employees().iter().map(|e| e.to_string()).collect();
    assert_eq!(employees, vec![String::from("C")]);
}

#[test]
fn test_record_rejects_complete_and_duplicate_shifts() {
    let closed: Shift = shift(
        1,
        &[component(
            1,
            "A",
            datetime!(2026-03-02 08:00 UTC),
            Some(datetime!(2026-03-02 16:00 UTC)),
        )],
    );
    assert!(matches!(
        LiveStateRecord::new(NOW, vec![closed]),
        Err(DomainError::CompleteShiftInLiveState { .. })
    ));

    let first: Shift = open(1, "A", datetime!(2026-03-02 08:00 UTC));
    let second: Shift = open(2, "A", datetime!(2026-03-02 09:00 UTC));
    assert_eq!(
        LiveStateRecord::new(NOW, vec![first, second]),
        Err(DomainError::DuplicateLiveStateEmployee(String::from("A")))
    );
}

#[test]
fn test_delta_reports_clock_ins_and_outs() {
    let previous: LiveStateRecord = LiveStateRecord::new(
        NOW,
        vec![
            open(1, "A", datetime!(2026-03-02 08:00 UTC)),
            open(2, "B", datetime!(2026-03-02 08:00 UTC)),
        ],
    )
    .unwrap();
    let current: LiveStateRecord = LiveStateRecord::new(
        NOW,
        vec![
            open(1, "A", datetime!(2026-03-02 08:00 UTC)),
            open(3, "C", datetime!(2026-03-02 12:00 UTC)),
        ],
    )
    .unwrap();

    let delta: LiveStateDelta = LiveStateDelta::between(Some(&previous), &current);
    assert_eq!(delta.clocked_in, vec![employee("C")]);
    assert_eq!(delta.clocked_out, vec![employee("B")]);

    let first: LiveStateDelta = LiveStateDelta::between(None, &previous);
    assert_eq!(first.clocked_in, vec![employee("A"), employee("B")]);
    assert!(LiveStateDelta::between(Some(&current), &current).is_empty());
}

#[test]
fn test_record_serializes_for_storage() {
    let record: LiveStateRecord =
        LiveStateRecord::new(NOW, vec![open(1, "A", datetime!(2026-03-02 08:00 UTC))])
            .unwrap()
            .with_id(4);
    let json: String = serde_json::to_string(&record).unwrap();
    let back: LiveStateRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

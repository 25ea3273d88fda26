// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{component, shift};
use crate::{DomainError, LayoutConfig, RowAssignment, Shift, assign_rows};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const NOW: OffsetDateTime = datetime!(2026-03-03 08:00 UTC);

fn closed(id: i64, start: OffsetDateTime, end: OffsetDateTime) -> Shift {
    shift(id, &[component(id, &id.to_string(), start, Some(end))])
}

fn rows(assignments: &[RowAssignment]) -> Vec<(i64, u16)> {
    assignments.iter().map(|a| (a.shift_id, a.row)).collect()
}

#[test]
fn test_identical_shifts_take_separate_lanes_and_lane_is_reused() {
    let nine = datetime!(2026-03-02 09:00 UTC);
    let five = datetime!(2026-03-02 17:00 UTC);
    let shifts = vec![
        closed(1, nine, five),
        closed(2, nine, five),
        closed(3, nine, five),
        closed(4, five, five + Duration::hours(4)),
    ];

    let assignments = assign_rows(&shifts, &[], LayoutConfig::default(), NOW).unwrap();
    assert_eq!(rows(&assignments), vec![(1, 0), (2, 1), (3, 2), (4, 0)]);
}

#[test]
fn test_pathological_shift_goes_to_overflow_lane() {
    let long: Shift = closed(
        1,
        datetime!(2026-03-01 09:00 UTC),
        datetime!(2026-03-02 02:00 UTC),
    );
    let normal: Shift = closed(
        2,
        datetime!(2026-03-01 10:00 UTC),
        datetime!(2026-03-01 18:00 UTC),
    );

    let assignments = assign_rows(&[long, normal], &[], LayoutConfig::default(), NOW).unwrap();
    assert_eq!(rows(&assignments), vec![(1, 30), (2, 0)]);
}

#[test]
fn test_open_shift_holds_its_lane_until_now() {
    let open: Shift = shift(
        1,
        &[component(1, "1", datetime!(2026-03-03 01:00 UTC), None)],
    );
    let later: Shift = closed(
        2,
        datetime!(2026-03-03 05:00 UTC),
        datetime!(2026-03-03 06:00 UTC),
    );
    let assignments = assign_rows(&[open, later], &[], LayoutConfig::default(), NOW).unwrap();
    assert_eq!(rows(&assignments), vec![(1, 0), (2, 1)]);
}

#[test]
fn test_seeded_lanes_are_respected() {
    let mut spanning: Shift = closed(
        9,
        datetime!(2026-03-02 06:00 UTC),
        datetime!(2026-03-02 14:00 UTC),
    );
    spanning.set_row(Some(0));
    let fresh: Shift = closed(
        1,
        datetime!(2026-03-02 09:00 UTC),
        datetime!(2026-03-02 17:00 UTC),
    );

    let assignments = assign_rows(&[fresh], &[spanning], LayoutConfig::default(), NOW).unwrap();
    assert_eq!(rows(&assignments), vec![(1, 1)]);
}

#[test]
fn test_lane_cap_is_a_hard_failure() {
    let config: LayoutConfig = LayoutConfig {
        lane_cap: 2,
        ..LayoutConfig::default()
    };
    let nine = datetime!(2026-03-02 09:00 UTC);
    let five = datetime!(2026-03-02 17:00 UTC);
    let shifts = vec![
        closed(1, nine, five),
        closed(2, nine, five),
        closed(3, nine, five),
    ];

    let err = assign_rows(&shifts, &[], config, NOW).unwrap_err();
    assert!(matches!(
        err,
        DomainError::LaneCapacityExceeded { cap: 2, .. }
    ));
}

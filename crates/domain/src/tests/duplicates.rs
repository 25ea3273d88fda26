// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::{component, shift};
use crate::{Shift, find_duplicate_shifts};
use time::macros::datetime;

#[test]
fn test_incomplete_duplicate_of_complete_shift_is_removed() {
    let complete: Shift = shift(
        1,
        &[component(
            1,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    let open: Shift = shift(
        2,
        &[component(2, "1", datetime!(2026-03-02 10:00 UTC), None)],
    );

    let shifts = vec![complete, open];
    assert_eq!(find_duplicate_shifts(&shifts), vec![2]);

    let survivors: Vec<Shift> = shifts
        .into_iter()
        .filter(|s| s.shift_id() != Some(2))
        .collect();
    assert!(find_duplicate_shifts(&survivors).is_empty());
}

#[test]
fn test_forgotten_clock_out_does_not_conflict_with_later_shifts() {
    let forgotten: Shift = shift(
        1,
        &[component(1, "1", datetime!(2026-03-01 09:00 UTC), None)],
    );
    let tuesday: Shift = shift(
        2,
        &[component(
            2,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    let overlap: Shift = shift(
        3,
        &[component(
            3,
            "1",
            datetime!(2026-03-02 10:00 UTC),
            Some(datetime!(2026-03-02 12:00 UTC)),
        )],
    );

    assert!(find_duplicate_shifts(&[forgotten.clone(), tuesday.clone()]).is_empty());
    assert_eq!(find_duplicate_shifts(&[overlap, tuesday, forgotten]), vec![3]);
}

#[test]
fn test_shorter_complete_shift_loses_and_ties_drop_current() {
    let long: Shift = shift(
        1,
        &[component(
            1,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    let short: Shift = shift(
        2,
        &[component(
            2,
            "1",
            datetime!(2026-03-02 10:00 UTC),
            Some(datetime!(2026-03-02 12:00 UTC)),
        )],
    );
    assert_eq!(find_duplicate_shifts(&[long.clone(), short]), vec![2]);

    let twin: Shift = shift(
        3,
        &[component(
            3,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    assert_eq!(find_duplicate_shifts(&[twin, long]), vec![3]);
}

#[test]
fn test_survivor_carries_forward_through_a_chain() {
    let first: Shift = shift(
        1,
        &[component(
            1,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 10:00 UTC)),
        )],
    );
    let longer: Shift = shift(
        2,
        &[component(
            2,
            "1",
            datetime!(2026-03-02 09:30 UTC),
            Some(datetime!(2026-03-02 18:00 UTC)),
        )],
    );
    let inside: Shift = shift(
        3,
        &[component(
            3,
            "1",
            datetime!(2026-03-02 12:00 UTC),
            Some(datetime!(2026-03-02 13:00 UTC)),
        )],
    );
    assert_eq!(
        find_duplicate_shifts(&[inside, longer, first]),
        vec![1, 3]
    );
}

#[test]
fn test_shifts_of_different_employees_never_conflict() {
    let a: Shift = shift(
        1,
        &[component(
            1,
            "1",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    let b: Shift = shift(
        2,
        &[component(
            2,
            "2",
            datetime!(2026-03-02 09:00 UTC),
            Some(datetime!(2026-03-02 17:00 UTC)),
        )],
    );
    assert!(find_duplicate_shifts(&[a, b]).is_empty());
}

#[test]
fn test_back_to_back_shifts_are_not_duplicates() {
    let a: Shift = shift(
        1,
        &[component(
            1,
            "1",
            datetime!(2026-03-02 01:00 UTC),
            Some(datetime!(2026-03-02 05:00 UTC)),
        )],
    );
    let b: Shift = shift(
        2,
        &[component(
            2,
            "1",
            datetime!(2026-03-02 05:00 UTC),
            Some(datetime!(2026-03-02 09:00 UTC)),
        )],
    );
    assert!(find_duplicate_shifts(&[a, b]).is_empty());
}

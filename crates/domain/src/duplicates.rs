// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{EmployeeId, Shift, ShiftId};
use std::collections::BTreeMap;
use time::Duration;

/// Finds shifts that overlap an earlier or better-supported shift of the
/// same employee.
///
/// Shifts are scanned per employee in ascending start order while tracking
/// the previous surviving shift. When the current shift starts before the
/// survivor ends, one of the pair is the duplicate:
///
/// - an incomplete current shift loses;
/// - otherwise the shorter shift loses, the current one on a tie.
///
/// An open survivor has no end and overlaps nothing; the current shift
/// simply takes its place. A forgotten clock-out therefore never removes
/// the shifts worked after it, and is never removed by them.
///
/// # Arguments
///
/// * `shifts` - Persisted shifts, any order, any employees
///
/// # Returns
///
/// The identifiers of the duplicate shifts. Shifts without an identifier
/// are ignored.
#[must_use]
pub fn find_duplicate_shifts(shifts: &[Shift]) -> Vec<ShiftId> {
    let mut by_employee: BTreeMap<&EmployeeId, Vec<&Shift>> = BTreeMap::new();
    for shift in shifts.iter().filter(|s| s.shift_id().is_some()) {
        by_employee.entry(shift.employee()).or_default().push(shift);
    }

    let mut duplicates: Vec<ShiftId> = Vec::new();
    for mut employee_shifts in by_employee.into_values() {
        employee_shifts.sort_by_key(|s| (s.start(), s.shift_id()));

        let mut survivor: Option<&Shift> = None;
        for current in employee_shifts {
            let Some(previous) = survivor else {
                survivor = Some(current);
                continue;
            };

            let Some(previous_end) = previous.end() else {
                survivor = Some(current);
                continue;
            };
            if current.start() >= previous_end {
                survivor = Some(current);
                continue;
            }

            let (duplicate, kept) = pick_duplicate(previous, current);
            if let Some(id) = duplicate.shift_id() {
                duplicates.push(id);
            }
            survivor = Some(kept);
        }
    }

    duplicates
}

/// Returns `(duplicate, survivor)` for an overlapping pair.
///
/// `previous` is always complete here.
fn pick_duplicate<'a>(previous: &'a Shift, current: &'a Shift) -> (&'a Shift, &'a Shift) {
    let previous_duration: Duration = previous.duration();
    match current.known_duration() {
        Some(current_duration) if previous_duration < current_duration => (previous, current),
        _ => (current, previous),
    }
}

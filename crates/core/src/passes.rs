// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Batch passes run after all components of a run have been matched.

use crate::error::CoreError;
use crate::store::ReconciliationStore;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use timeclock_domain::{
    LayoutConfig, LiveStateDelta, LiveStateRecord, RowAssignment, Shift, ShiftId, assign_rows,
    compute_live_state, find_duplicate_shifts,
};
use tracing::{debug, info};

/// Loads the shifts running at `from` followed by those starting after it.
fn shifts_from<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    from: OffsetDateTime,
) -> Result<(Vec<Shift>, Vec<Shift>), CoreError> {
    let spanning: Vec<Shift> = store.shifts_spanning(from)?;
    let starting: Vec<Shift> = store.shifts_starting_at_or_after(Some(from))?;
    Ok((spanning, starting))
}

/// Deletes shifts that duplicate an overlapping shift of the same employee.
///
/// Shifts still running at `from` take part so that a re-imported shift
/// starting inside the window is compared against them.
///
/// # Returns
///
/// The identifiers of the deleted shifts.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn resolve_duplicates<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    from: OffsetDateTime,
) -> Result<Vec<ShiftId>, CoreError> {
    let (mut shifts, starting) = shifts_from(store, from)?;
    shifts.extend(starting);

    let duplicates: Vec<ShiftId> = find_duplicate_shifts(&shifts);
    for shift_id in &duplicates {
        store.delete_shift(*shift_id)?;
        info!(shift_id, "Deleted duplicate shift");
    }
    Ok(duplicates)
}

/// Recomputes display lanes for shifts starting at or after `from`.
///
/// Lanes held by shifts still running at `from` are left where they are.
/// Only rows that change are written.
///
/// # Returns
///
/// The number of rows written.
///
/// # Errors
///
/// Returns an error if the store fails or the lanes run out.
pub fn layout_rows<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    from: OffsetDateTime,
    config: LayoutConfig,
    now: OffsetDateTime,
) -> Result<usize, CoreError> {
    let (seeds, shifts) = shifts_from(store, from)?;
    let current: BTreeMap<ShiftId, Option<u16>> = shifts
        .iter()
        .filter_map(|s| s.shift_id().map(|id| (id, s.row())))
        .collect();

    let assignments: Vec<RowAssignment> = assign_rows(&shifts, &seeds, config, now)?;
    let mut written: usize = 0;
    for assignment in assignments {
        if current.get(&assignment.shift_id).copied().flatten() == Some(assignment.row) {
            continue;
        }
        store.set_shift_row(assignment.shift_id, Some(assignment.row))?;
        debug!(
            shift_id = assignment.shift_id,
            row = assignment.row,
            "Assigned row"
        );
        written += 1;
    }
    Ok(written)
}

/// Computes the next live state record without storing it.
///
/// # Errors
///
/// Returns an error if the store fails or the record is invalid.
pub fn snapshot_live_state<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    previous: Option<&LiveStateRecord>,
    now: OffsetDateTime,
) -> Result<(LiveStateRecord, LiveStateDelta), CoreError> {
    let open: Vec<Shift> = store.incomplete_shifts()?;

    let mut refreshed: Vec<Shift> = Vec::new();
    for shift_id in previous
        .iter()
        .flat_map(|record| record.shifts())
        .filter_map(Shift::shift_id)
    {
        if let Some(shift) = store.get_shift(shift_id)? {
            refreshed.push(shift);
        }
    }

    let record: LiveStateRecord = compute_live_state(&open, &refreshed, now)?;
    let delta: LiveStateDelta = LiveStateDelta::between(previous, &record);
    Ok((record, delta))
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use timeclock_domain::{Shift, ShiftId};
use tracing::debug;

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{NewShift, row_column};
use crate::diesel_schema::{components, shifts};
use crate::error::PersistenceError;

fn require_id(shift: &Shift, operation: &str) -> Result<ShiftId, PersistenceError> {
    shift
        .shift_id()
        .ok_or_else(|| PersistenceError::QueryFailed(format!("{operation}: shift has no id")))
}

fn expect_one(updated: usize, shift_id: ShiftId) -> Result<(), PersistenceError> {
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Shift {shift_id}")));
    }
    Ok(())
}

/// Inserts a new shift and returns it with its identifier.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_shift(conn: &mut SqliteConnection, shift: &Shift) -> Result<Shift, PersistenceError> {
    let row: NewShift<'_> = NewShift::from_domain(shift)?;
    diesel::insert_into(shifts::table)
        .values(&row)
        .execute(conn)?;

    let shift_id: ShiftId = get_last_insert_rowid(conn)?;
    Ok(shift.clone().with_id(shift_id))
}

/// Overwrites the derived fields of a persisted shift.
///
/// The display row is owned by the layout pass and left as stored.
///
/// # Errors
///
/// Returns an error if the shift was never persisted, no longer exists, or
/// the update fails.
pub fn update_shift(conn: &mut SqliteConnection, shift: &Shift) -> Result<(), PersistenceError> {
    let shift_id: ShiftId = require_id(shift, "update_shift")?;
    let component_ids_json: String = serde_json::to_string(shift.component_ids())?;

    let updated: usize = diesel::update(shifts::table.find(shift_id))
        .set((
            shifts::component_ids_json.eq(component_ids_json),
            shifts::start_ts.eq(shift.start().unix_timestamp()),
            shifts::end_ts.eq(shift.end().map(OffsetDateTime::unix_timestamp)),
            shifts::duration_secs.eq(shift.duration().whole_seconds()),
            shifts::state.eq(shift.state().as_str()),
            shifts::open_since_ts.eq(shift.open_since().map(OffsetDateTime::unix_timestamp)),
        ))
        .execute(conn)?;
    expect_one(updated, shift_id)
}

/// Sets the display row of a shift.
///
/// # Errors
///
/// Returns an error if the shift does not exist or the update fails.
pub fn set_shift_row(
    conn: &mut SqliteConnection,
    shift_id: ShiftId,
    row: Option<u16>,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(shifts::table.find(shift_id))
        .set(shifts::row_index.eq(row_column(row)))
        .execute(conn)?;
    expect_one(updated, shift_id)
}

/// Deletes a shift and detaches its components.
///
/// Both steps run in one transaction. Deleting a shift that is already
/// gone is not an error.
///
/// # Errors
///
/// Returns an error if the transaction fails.
pub fn delete_shift(
    conn: &mut SqliteConnection,
    shift_id: ShiftId,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let detached: usize =
            diesel::update(components::table.filter(components::shift_id.eq(shift_id)))
                .set(components::shift_id.eq(None::<i64>))
                .execute(conn)?;
        let deleted: usize = diesel::delete(shifts::table.find(shift_id)).execute(conn)?;
        debug!(shift_id, detached, deleted, "Deleted shift");
        Ok(())
    })
}

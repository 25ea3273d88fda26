// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift queries.
//!
//! Every list is ordered by start, then by identifier.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use time::{Duration, OffsetDateTime};
use timeclock_domain::{EmployeeId, Shift, ShiftId, ShiftState};

use crate::data_models::ShiftRow;
use crate::diesel_schema::shifts;
use crate::error::PersistenceError;

fn into_shifts(rows: Vec<ShiftRow>) -> Result<Vec<Shift>, PersistenceError> {
    rows.into_iter().map(ShiftRow::into_domain).collect()
}

/// Loads a shift by identifier.
///
/// # Errors
///
/// Returns an error if the query fails or the row is invalid.
pub fn get_shift(
    conn: &mut SqliteConnection,
    shift_id: ShiftId,
) -> Result<Option<Shift>, PersistenceError> {
    shifts::table
        .filter(shifts::shift_id.eq(shift_id))
        .select(ShiftRow::as_select())
        .first::<ShiftRow>(conn)
        .optional()?
        .map(ShiftRow::into_domain)
        .transpose()
}

/// Finds the shift a component starting at `start` should join.
///
/// The candidate is the employee's shift with the latest end in
/// `(start - threshold, start]`. Open shifts never qualify.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `employee` - The employee who punched
/// * `start` - The start of the component being placed
/// * `threshold` - The merge window
///
/// # Errors
///
/// Returns an error if the query fails or the row is invalid.
pub fn find_parent_candidate(
    conn: &mut SqliteConnection,
    employee: &EmployeeId,
    start: OffsetDateTime,
    threshold: Duration,
) -> Result<Option<Shift>, PersistenceError> {
    let start_ts: i64 = start.unix_timestamp();
    let floor_ts: i64 = (start - threshold).unix_timestamp();

    shifts::table
        .filter(shifts::employee_id.eq(employee.value()))
        .filter(shifts::end_ts.le(start_ts))
        .filter(shifts::end_ts.gt(floor_ts))
        .order((shifts::end_ts.desc(), shifts::shift_id.desc()))
        .select(ShiftRow::as_select())
        .first::<ShiftRow>(conn)
        .optional()?
        .map(ShiftRow::into_domain)
        .transpose()
}

/// Returns shifts starting at or after `from`, or every shift if `None`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn shifts_starting_at_or_after(
    conn: &mut SqliteConnection,
    from: Option<OffsetDateTime>,
) -> Result<Vec<Shift>, PersistenceError> {
    let from_ts: i64 = from.map_or(i64::MIN, OffsetDateTime::unix_timestamp);
    let rows: Vec<ShiftRow> = shifts::table
        .filter(shifts::start_ts.ge(from_ts))
        .order((shifts::start_ts.asc(), shifts::shift_id.asc()))
        .select(ShiftRow::as_select())
        .load::<ShiftRow>(conn)?;
    into_shifts(rows)
}

/// Returns shifts that started before `at` and are still running at `at`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn shifts_spanning(
    conn: &mut SqliteConnection,
    at: OffsetDateTime,
) -> Result<Vec<Shift>, PersistenceError> {
    let at_ts: i64 = at.unix_timestamp();
    let rows: Vec<ShiftRow> = shifts::table
        .filter(shifts::start_ts.lt(at_ts))
        .filter(shifts::end_ts.is_null().or(shifts::end_ts.gt(at_ts)))
        .order((shifts::start_ts.asc(), shifts::shift_id.asc()))
        .select(ShiftRow::as_select())
        .load::<ShiftRow>(conn)?;
    into_shifts(rows)
}

/// Returns every incomplete shift.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn incomplete_shifts(conn: &mut SqliteConnection) -> Result<Vec<Shift>, PersistenceError> {
    let rows: Vec<ShiftRow> = shifts::table
        .filter(shifts::state.eq(ShiftState::Incomplete.as_str()))
        .order((shifts::start_ts.asc(), shifts::shift_id.asc()))
        .select(ShiftRow::as_select())
        .load::<ShiftRow>(conn)?;
    into_shifts(rows)
}

/// Returns shifts overlapping `[min, max)`, optionally for one employee.
///
/// Open shifts overlap any range ending after their start. A missing bound
/// leaves that side unbounded.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `min` - Inclusive lower bound
/// * `max` - Exclusive upper bound
/// * `employee` - Restricts the result to one employee when set
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn shifts_in_range(
    conn: &mut SqliteConnection,
    min: Option<OffsetDateTime>,
    max: Option<OffsetDateTime>,
    employee: Option<&EmployeeId>,
) -> Result<Vec<Shift>, PersistenceError> {
    let min_ts: i64 = min.map_or(i64::MIN, OffsetDateTime::unix_timestamp);
    let max_ts: i64 = max.map_or(i64::MAX, OffsetDateTime::unix_timestamp);

    let mut query: shifts::BoxedQuery<'_, Sqlite> = shifts::table
        .filter(shifts::start_ts.lt(max_ts))
        .filter(shifts::end_ts.is_null().or(shifts::end_ts.ge(min_ts)))
        .into_boxed();
    if let Some(employee) = employee {
        query = query.filter(shifts::employee_id.eq(employee.value().to_string()));
    }

    let rows: Vec<ShiftRow> = query
        .order((shifts::start_ts.asc(), shifts::shift_id.asc()))
        .select(ShiftRow::as_select())
        .load::<ShiftRow>(conn)?;
    into_shifts(rows)
}

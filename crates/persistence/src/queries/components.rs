// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Component queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use timeclock_domain::{Component, ComponentId, EmployeeId};

use crate::data_models::ComponentRow;
use crate::diesel_schema::components;
use crate::error::PersistenceError;

/// Looks up a component by `(employee, start)`.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `employee` - The employee who punched
/// * `start` - The component start instant
///
/// # Errors
///
/// Returns an error if the query fails or the row is invalid.
pub fn find_component(
    conn: &mut SqliteConnection,
    employee: &EmployeeId,
    start: OffsetDateTime,
) -> Result<Option<Component>, PersistenceError> {
    let row: Option<ComponentRow> = components::table
        .filter(components::employee_id.eq(employee.value()))
        .filter(components::start_ts.eq(start.unix_timestamp()))
        .select(ComponentRow::as_select())
        .first::<ComponentRow>(conn)
        .optional()?;

    row.map(ComponentRow::into_domain).transpose()
}

/// Loads components by identifier, ordered by start.
///
/// Unknown identifiers are skipped.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn get_components(
    conn: &mut SqliteConnection,
    ids: &[ComponentId],
) -> Result<Vec<Component>, PersistenceError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    components::table
        .filter(components::component_id.eq_any(ids))
        .order((components::start_ts.asc(), components::component_id.asc()))
        .select(ComponentRow::as_select())
        .load::<ComponentRow>(conn)?
        .into_iter()
        .map(ComponentRow::into_domain)
        .collect()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Component mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use timeclock_domain::{Component, ComponentId};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::NewComponent;
use crate::diesel_schema::components;
use crate::error::PersistenceError;

/// Inserts a new component and returns it with its identifier.
///
/// # Errors
///
/// Returns an error if the insert fails, including when a component with
/// the same `(employee, start)` already exists.
pub fn insert_component(
    conn: &mut SqliteConnection,
    component: &Component,
) -> Result<Component, PersistenceError> {
    let row: NewComponent<'_> = NewComponent::from_domain(component)?;
    diesel::insert_into(components::table)
        .values(&row)
        .execute(conn)?;

    let component_id: ComponentId = get_last_insert_rowid(conn)?;
    Ok(component.clone().with_id(component_id))
}

/// Overwrites the mutable fields of a persisted component.
///
/// The identity columns are never touched.
///
/// # Errors
///
/// Returns an error if the component was never persisted, no longer exists,
/// or the update fails.
pub fn update_component(
    conn: &mut SqliteConnection,
    component: &Component,
) -> Result<(), PersistenceError> {
    let component_id: ComponentId = component.component_id().ok_or_else(|| {
        PersistenceError::QueryFailed(String::from("update_component: component has no id"))
    })?;
    let punch_ids_json: String = serde_json::to_string(component.punches())?;

    let updated: usize = diesel::update(components::table.find(component_id))
        .set((
            components::end_ts.eq(component.end().map(OffsetDateTime::unix_timestamp)),
            components::punch_ids_json.eq(punch_ids_json),
            components::is_manual.eq(i32::from(component.is_manual())),
            components::shift_id.eq(component.shift_id()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Component {component_id}"
        )));
    }
    Ok(())
}

/// Deletes a component by identifier.
///
/// # Errors
///
/// Returns an error if the component does not exist or the delete fails.
pub fn delete_component(
    conn: &mut SqliteConnection,
    component_id: ComponentId,
) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(components::table.find(component_id)).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Component {component_id}"
        )));
    }
    Ok(())
}

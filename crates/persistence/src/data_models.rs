// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and their conversion to domain values.
//!
//! Instants are stored as Unix seconds. Components are keyed on whole
//! seconds, so nothing is lost.

use diesel::prelude::*;
use time::{Duration, OffsetDateTime};
use timeclock_domain::{
    Component, ComponentId, EmployeeId, LiveStateRecord, PunchId, Shift, ShiftBounds, ShiftState,
};

use crate::diesel_schema::{components, live_states, shifts};
use crate::error::PersistenceError;

/// A stored component row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = components)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ComponentRow {
    pub component_id: i64,
    pub employee_id: String,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
    pub is_manual: i32,
    pub punch_ids_json: String,
    pub shift_id: Option<i64>,
}

/// Insertable form of a component.
#[derive(Debug, Insertable)]
#[diesel(table_name = components)]
pub struct NewComponent<'a> {
    pub employee_id: &'a str,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
    pub is_manual: i32,
    pub punch_ids_json: String,
    pub shift_id: Option<i64>,
}

/// A stored shift row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shifts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShiftRow {
    pub shift_id: i64,
    pub employee_id: String,
    pub component_ids_json: String,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
    pub duration_secs: i64,
    pub state: String,
    pub open_since_ts: Option<i64>,
    pub row_index: Option<i32>,
}

/// Insertable form of a shift.
#[derive(Debug, Insertable)]
#[diesel(table_name = shifts)]
pub struct NewShift<'a> {
    pub employee_id: &'a str,
    pub component_ids_json: String,
    pub start_ts: i64,
    pub end_ts: Option<i64>,
    pub duration_secs: i64,
    pub state: &'static str,
    pub open_since_ts: Option<i64>,
    pub row_index: Option<i32>,
}

/// A stored live state row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = live_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LiveStateRow {
    pub live_state_id: i64,
    pub created_at: String,
    pub record_json: String,
}

/// Converts stored Unix seconds back into an instant.
///
/// # Errors
///
/// Returns an error if the value is out of range.
pub fn instant_from_ts(ts: i64) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::from_unix_timestamp(ts)
        .map_err(|e| PersistenceError::ReconstructionError(format!("timestamp {ts}: {e}")))
}

fn optional_instant(ts: Option<i64>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    ts.map(instant_from_ts).transpose()
}

fn employee_from_row(value: &str) -> Result<EmployeeId, PersistenceError> {
    EmployeeId::new(value).map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

/// Converts a domain row index into its column value.
#[must_use]
pub fn row_column(row: Option<u16>) -> Option<i32> {
    row.map(i32::from)
}

fn row_from_column(row_index: Option<i32>) -> Result<Option<u16>, PersistenceError> {
    row_index
        .map(|value| {
            u16::try_from(value).map_err(|_| {
                PersistenceError::ReconstructionError(format!("invalid row index {value}"))
            })
        })
        .transpose()
}

impl ComponentRow {
    /// Rebuilds the domain component.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is invalid.
    pub fn into_domain(self) -> Result<Component, PersistenceError> {
        let punches: Vec<PunchId> = serde_json::from_str(&self.punch_ids_json)?;
        let component: Component = Component::new(
            employee_from_row(&self.employee_id)?,
            instant_from_ts(self.start_ts)?,
            optional_instant(self.end_ts)?,
            punches,
            self.is_manual != 0,
        )
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
        Ok(component
            .with_id(self.component_id)
            .with_shift(self.shift_id))
    }
}

impl<'a> NewComponent<'a> {
    /// Builds an insertable row from a domain component.
    ///
    /// # Errors
    ///
    /// Returns an error if the punch list cannot be serialized.
    pub fn from_domain(component: &'a Component) -> Result<Self, PersistenceError> {
        Ok(Self {
            employee_id: component.employee().value(),
            start_ts: component.start().unix_timestamp(),
            end_ts: component.end().map(OffsetDateTime::unix_timestamp),
            is_manual: i32::from(component.is_manual()),
            punch_ids_json: serde_json::to_string(component.punches())?,
            shift_id: component.shift_id(),
        })
    }
}

impl ShiftRow {
    /// Rebuilds the domain shift.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value is invalid.
    pub fn into_domain(self) -> Result<Shift, PersistenceError> {
        let component_ids: Vec<ComponentId> = serde_json::from_str(&self.component_ids_json)?;
        let state: ShiftState = self
            .state
            .parse()
            .map_err(|e: timeclock_domain::DomainError| {
                PersistenceError::ReconstructionError(e.to_string())
            })?;
        let bounds: ShiftBounds = ShiftBounds {
            start: instant_from_ts(self.start_ts)?,
            end: optional_instant(self.end_ts)?,
            duration: Duration::seconds(self.duration_secs),
            state,
            open_since: optional_instant(self.open_since_ts)?,
        };
        Ok(Shift::restore(
            self.shift_id,
            employee_from_row(&self.employee_id)?,
            component_ids,
            bounds,
            row_from_column(self.row_index)?,
        ))
    }
}

impl<'a> NewShift<'a> {
    /// Builds an insertable row from a domain shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the component list cannot be serialized.
    pub fn from_domain(shift: &'a Shift) -> Result<Self, PersistenceError> {
        Ok(Self {
            employee_id: shift.employee().value(),
            component_ids_json: serde_json::to_string(shift.component_ids())?,
            start_ts: shift.start().unix_timestamp(),
            end_ts: shift.end().map(OffsetDateTime::unix_timestamp),
            duration_secs: shift.duration().whole_seconds(),
            state: shift.state().as_str(),
            open_since_ts: shift.open_since().map(OffsetDateTime::unix_timestamp),
            row_index: row_column(shift.row()),
        })
    }
}

impl LiveStateRow {
    /// Rebuilds the domain record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored JSON is invalid.
    pub fn into_domain(self) -> Result<LiveStateRecord, PersistenceError> {
        let record: LiveStateRecord = serde_json::from_str(&self.record_json)?;
        Ok(record.with_id(self.live_state_id))
    }
}

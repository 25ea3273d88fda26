// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{EmployeeId, Shift};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// Identifier assigned by the store to a live state record.
pub type LiveStateId = i64;

/// An immutable snapshot of who is currently clocked in.
///
/// Holds at most one shift per employee, and only incomplete shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStateRecord {
    record_id: Option<LiveStateId>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    /// Open shifts ordered by employee.
    shifts: Vec<Shift>,
}

impl LiveStateRecord {
    /// Creates a new, unpersisted live state record.
    ///
    /// # Errors
    ///
    /// Returns an error if two shifts belong to the same employee or any
    /// shift is complete.
    pub fn new(created_at: OffsetDateTime, mut shifts: Vec<Shift>) -> Result<Self, DomainError> {
        let mut seen: BTreeSet<&EmployeeId> = BTreeSet::new();
        for shift in &shifts {
            if !shift.is_open() {
                return Err(DomainError::CompleteShiftInLiveState {
                    employee: shift.employee().to_string(),
                });
            }
            if !seen.insert(shift.employee()) {
                return Err(DomainError::DuplicateLiveStateEmployee(
                    shift.employee().to_string(),
                ));
            }
        }
        shifts.sort_by(|a, b| a.employee().cmp(b.employee()));
        Ok(Self {
            record_id: None,
            created_at,
            shifts,
        })
    }

    /// Returns this record with a store-assigned identifier.
    #[must_use]
    pub const fn with_id(mut self, record_id: LiveStateId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Returns the store-assigned identifier, if persisted.
    #[must_use]
    pub const fn record_id(&self) -> Option<LiveStateId> {
        self.record_id
    }

    /// Returns when the record was created.
    #[must_use]
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns the open shifts, ordered by employee.
    #[must_use]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Returns the employees currently clocked in.
    #[must_use]
    pub fn employees(&self) -> BTreeSet<&EmployeeId> {
        self.shifts.iter().map(Shift::employee).collect()
    }

    /// Returns the open shift for `employee`, if clocked in.
    #[must_use]
    pub fn shift_for(&self, employee: &EmployeeId) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.employee() == employee)
    }
}

/// Who changed state between two consecutive records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStateDelta {
    /// Employees present now but not before.
    pub clocked_in: Vec<EmployeeId>,
    /// Employees present before but not now.
    pub clocked_out: Vec<EmployeeId>,
}

impl LiveStateDelta {
    /// Computes the delta from `previous` to `current`.
    #[must_use]
    pub fn between(previous: Option<&LiveStateRecord>, current: &LiveStateRecord) -> Self {
        let before: BTreeSet<&EmployeeId> =
            previous.map(LiveStateRecord::employees).unwrap_or_default();
        let after: BTreeSet<&EmployeeId> = current.employees();

        Self {
            clocked_in: after.difference(&before).map(|e| (*e).clone()).collect(),
            clocked_out: before.difference(&after).map(|e| (*e).clone()).collect(),
        }
    }

    /// Returns whether nobody changed state.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.clocked_in.is_empty() && self.clocked_out.is_empty()
    }
}

/// Computes the next live state record.
///
/// # Arguments
///
/// * `open` - All incomplete shifts in the store
/// * `refreshed_previous` - The current store version of each shift held by
///   the previous record; shifts that no longer exist are simply absent
/// * `created_at` - The creation instant of the new record
///
/// The most recent open shift per employee wins. A previous shift that is
/// still open is carried forward if its employee is not already present;
/// closed or vanished ones drop out.
///
/// # Errors
///
/// Returns an error if the resulting record is invalid.
pub fn compute_live_state(
    open: &[Shift],
    refreshed_previous: &[Shift],
    created_at: OffsetDateTime,
) -> Result<LiveStateRecord, DomainError> {
    let mut latest: BTreeMap<&EmployeeId, &Shift> = BTreeMap::new();
    for shift in open.iter().filter(|s| s.is_open()) {
        latest
            .entry(shift.employee())
            .and_modify(|held| {
                if shift.start() > held.start() {
                    *held = shift;
                }
            })
            .or_insert(shift);
    }

    for shift in refreshed_previous.iter().filter(|s| s.is_open()) {
        latest.entry(shift.employee()).or_insert(shift);
    }

    LiveStateRecord::new(created_at, latest.into_values().cloned().collect())
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The persisted store the engine reconciles against.

use time::{Duration, OffsetDateTime};
use timeclock_domain::{
    Component, ComponentId, EmployeeId, LiveStateRecord, Shift, ShiftId,
};

/// Errors reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached.
    Unavailable(String),
    /// The store did not answer in time.
    Timeout(String),
    /// Any other backend failure.
    Backend(String),
}

impl StoreError {
    /// Returns whether the failure may clear up on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            Self::Timeout(msg) => write!(f, "Store timed out: {msg}"),
            Self::Backend(msg) => write!(f, "Store backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Keyed access to components, shifts, live state records and sync
/// checkpoints.
///
/// Components are keyed by `(employee, start)`. Shifts are keyed by an
/// opaque identifier assigned on insert. Live state records and sync
/// checkpoints are insert-only.
pub trait ReconciliationStore {
    /// Looks up a component by identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn find_component(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
    ) -> Result<Option<Component>, StoreError>;

    /// Inserts a new component and returns it with its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the identity already exists.
    fn insert_component(&mut self, component: &Component) -> Result<Component, StoreError>;

    /// Overwrites the end, punches, manual flag and parent of a persisted
    /// component.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn update_component(&mut self, component: &Component) -> Result<(), StoreError>;

    /// Deletes a component that a wider observation has replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn delete_component(&mut self, component_id: ComponentId) -> Result<(), StoreError>;

    /// Loads components by identifier. Unknown identifiers are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn get_components(&mut self, ids: &[ComponentId]) -> Result<Vec<Component>, StoreError>;

    /// Loads a shift by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn get_shift(&mut self, shift_id: ShiftId) -> Result<Option<Shift>, StoreError>;

    /// Finds the shift for `employee` with the latest end in
    /// `(start - threshold, start]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn find_parent_candidate(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
        threshold: Duration,
    ) -> Result<Option<Shift>, StoreError>;

    /// Inserts a new shift and returns it with its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, StoreError>;

    /// Overwrites the derived fields of a persisted shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn update_shift(&mut self, shift: &Shift) -> Result<(), StoreError>;

    /// Deletes a shift and detaches its components.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn delete_shift(&mut self, shift_id: ShiftId) -> Result<(), StoreError>;

    /// Returns shifts starting at or after `from` (all shifts if `None`),
    /// ordered by start.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn shifts_starting_at_or_after(
        &mut self,
        from: Option<OffsetDateTime>,
    ) -> Result<Vec<Shift>, StoreError>;

    /// Returns shifts that started before `at` and are still running at
    /// `at`, ordered by start.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn shifts_spanning(&mut self, at: OffsetDateTime) -> Result<Vec<Shift>, StoreError>;

    /// Sets the display lane of a shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn set_shift_row(&mut self, shift_id: ShiftId, row: Option<u16>) -> Result<(), StoreError>;

    /// Returns every incomplete shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn incomplete_shifts(&mut self) -> Result<Vec<Shift>, StoreError>;

    /// Returns the most recently appended live state record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn latest_live_state(&mut self) -> Result<Option<LiveStateRecord>, StoreError>;

    /// Appends a live state record and returns it with its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn append_live_state(
        &mut self,
        record: &LiveStateRecord,
    ) -> Result<LiveStateRecord, StoreError>;

    /// Returns the instant of the most recent successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn last_synced_at(&mut self) -> Result<Option<OffsetDateTime>, StoreError>;

    /// Records a successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    fn record_sync(&mut self, at: OffsetDateTime) -> Result<(), StoreError>;
}

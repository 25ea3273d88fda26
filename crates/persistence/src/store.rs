// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The reconciliation store backed by `SQLite`.

use time::{Duration, OffsetDateTime};
use timeclock::{ReconciliationStore, StoreError};
use timeclock_domain::{Component, ComponentId, EmployeeId, LiveStateRecord, Shift, ShiftId};

use crate::{Persistence, mutations, queries};

impl ReconciliationStore for Persistence {
    fn find_component(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
    ) -> Result<Option<Component>, StoreError> {
        Ok(queries::find_component(&mut self.conn, employee, start)?)
    }

    fn insert_component(&mut self, component: &Component) -> Result<Component, StoreError> {
        Ok(mutations::insert_component(&mut self.conn, component)?)
    }

    fn update_component(&mut self, component: &Component) -> Result<(), StoreError> {
        Ok(mutations::update_component(&mut self.conn, component)?)
    }

    fn delete_component(&mut self, component_id: ComponentId) -> Result<(), StoreError> {
        Ok(mutations::delete_component(&mut self.conn, component_id)?)
    }

    fn get_components(&mut self, ids: &[ComponentId]) -> Result<Vec<Component>, StoreError> {
        Ok(queries::get_components(&mut self.conn, ids)?)
    }

    fn get_shift(&mut self, shift_id: ShiftId) -> Result<Option<Shift>, StoreError> {
        Ok(queries::get_shift(&mut self.conn, shift_id)?)
    }

    fn find_parent_candidate(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
        threshold: Duration,
    ) -> Result<Option<Shift>, StoreError> {
        Ok(queries::find_parent_candidate(
            &mut self.conn,
            employee,
            start,
            threshold,
        )?)
    }

    fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, StoreError> {
        Ok(mutations::insert_shift(&mut self.conn, shift)?)
    }

    fn update_shift(&mut self, shift: &Shift) -> Result<(), StoreError> {
        Ok(mutations::update_shift(&mut self.conn, shift)?)
    }

    fn delete_shift(&mut self, shift_id: ShiftId) -> Result<(), StoreError> {
        Ok(mutations::delete_shift(&mut self.conn, shift_id)?)
    }

    fn shifts_starting_at_or_after(
        &mut self,
        from: Option<OffsetDateTime>,
    ) -> Result<Vec<Shift>, StoreError> {
        Ok(queries::shifts_starting_at_or_after(&mut self.conn, from)?)
    }

    fn shifts_spanning(&mut self, at: OffsetDateTime) -> Result<Vec<Shift>, StoreError> {
        Ok(queries::shifts_spanning(&mut self.conn, at)?)
    }

    fn set_shift_row(&mut self, shift_id: ShiftId, row: Option<u16>) -> Result<(), StoreError> {
        Ok(mutations::set_shift_row(&mut self.conn, shift_id, row)?)
    }

    fn incomplete_shifts(&mut self) -> Result<Vec<Shift>, StoreError> {
        Ok(queries::incomplete_shifts(&mut self.conn)?)
    }

    fn latest_live_state(&mut self) -> Result<Option<LiveStateRecord>, StoreError> {
        Ok(queries::latest_live_state(&mut self.conn)?)
    }

    fn append_live_state(
        &mut self,
        record: &LiveStateRecord,
    ) -> Result<LiveStateRecord, StoreError> {
        Ok(mutations::append_live_state(&mut self.conn, record)?)
    }

    fn last_synced_at(&mut self) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(queries::last_synced_at(&mut self.conn)?)
    }

    fn record_sync(&mut self, at: OffsetDateTime) -> Result<(), StoreError> {
        Ok(mutations::record_sync(&mut self.conn, at)?)
    }
}

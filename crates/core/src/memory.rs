// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::store::{ReconciliationStore, StoreError};
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime};
use timeclock_domain::{
    Component, ComponentId, EmployeeId, LiveStateId, LiveStateRecord, Shift, ShiftId,
    within_merge_window,
};

/// A store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    components: BTreeMap<ComponentId, Component>,
    shifts: BTreeMap<ShiftId, Shift>,
    live_states: Vec<LiveStateRecord>,
    syncs: Vec<OffsetDateTime>,
    next_component_id: ComponentId,
    next_shift_id: ShiftId,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every shift ordered by start.
    #[must_use]
    pub fn shifts(&self) -> Vec<Shift> {
        let mut shifts: Vec<Shift> = self.shifts.values().cloned().collect();
        shifts.sort_by_key(|s| (s.start(), s.shift_id()));
        shifts
    }

    /// Returns every component ordered by identifier.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        self.components.values().cloned().collect()
    }

    /// Returns every appended live state record, oldest first.
    #[must_use]
    pub fn live_states(&self) -> &[LiveStateRecord] {
        &self.live_states
    }

    /// Returns every recorded sync checkpoint, oldest first.
    #[must_use]
    pub fn syncs(&self) -> &[OffsetDateTime] {
        &self.syncs
    }

    fn sorted(&self, mut keep: impl FnMut(&Shift) -> bool) -> Vec<Shift> {
        let mut shifts: Vec<Shift> = self.shifts.values().filter(|s| keep(s)).cloned().collect();
        shifts.sort_by_key(|s| (s.start(), s.shift_id()));
        shifts
    }
}

impl ReconciliationStore for InMemoryStore {
    fn find_component(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
    ) -> Result<Option<Component>, StoreError> {
        Ok(self
            .components
            .values()
            .find(|c| c.employee() == employee && c.start() == start)
            .cloned())
    }

    fn insert_component(&mut self, component: &Component) -> Result<Component, StoreError> {
        if self
            .components
            .values()
            .any(|c| c.employee() == component.employee() && c.start() == component.start())
        {
            return Err(StoreError::Backend(format!(
                "Component for employee '{}' starting at {} already exists",
                component.employee(),
                component.start()
            )));
        }
        self.next_component_id += 1;
        let stored: Component = component.clone().with_id(self.next_component_id);
        self.components
            .insert(self.next_component_id, stored.clone());
        Ok(stored)
    }

    fn update_component(&mut self, component: &Component) -> Result<(), StoreError> {
        let id: ComponentId = component
            .component_id()
            .ok_or_else(|| StoreError::Backend(String::from("Component has no identifier")))?;
        let slot: &mut Component = self
            .components
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("Component {id} not found")))?;
        *slot = component.clone();
        Ok(())
    }

    fn delete_component(&mut self, component_id: ComponentId) -> Result<(), StoreError> {
        self.components
            .remove(&component_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::Backend(format!("Component {component_id} not found")))
    }

    fn get_components(&mut self, ids: &[ComponentId]) -> Result<Vec<Component>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.components.get(id))
            .cloned()
            .collect())
    }

    fn get_shift(&mut self, shift_id: ShiftId) -> Result<Option<Shift>, StoreError> {
        Ok(self.shifts.get(&shift_id).cloned())
    }

    fn find_parent_candidate(
        &mut self,
        employee: &EmployeeId,
        start: OffsetDateTime,
        threshold: Duration,
    ) -> Result<Option<Shift>, StoreError> {
        Ok(self
            .shifts
            .values()
            .filter(|s| s.employee() == employee)
            .filter(|s| s.end().is_some_and(|end| within_merge_window(end, start, threshold)))
            .max_by_key(|s| (s.end(), s.shift_id()))
            .cloned())
    }

    fn insert_shift(&mut self, shift: &Shift) -> Result<Shift, StoreError> {
        self.next_shift_id += 1;
        let stored: Shift = shift.clone().with_id(self.next_shift_id);
        self.shifts.insert(self.next_shift_id, stored.clone());
        Ok(stored)
    }

    fn update_shift(&mut self, shift: &Shift) -> Result<(), StoreError> {
        let id: ShiftId = shift
            .shift_id()
            .ok_or_else(|| StoreError::Backend(String::from("Shift has no identifier")))?;
        let slot: &mut Shift = self
            .shifts
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(format!("Shift {id} not found")))?;
        let row: Option<u16> = slot.row();
        *slot = shift.clone();
        slot.set_row(row);
        Ok(())
    }

    fn delete_shift(&mut self, shift_id: ShiftId) -> Result<(), StoreError> {
        self.shifts.remove(&shift_id);
        for component in self.components.values_mut() {
            if component.shift_id() == Some(shift_id) {
                component.set_shift_id(None);
            }
        }
        Ok(())
    }

    fn shifts_starting_at_or_after(
        &mut self,
        from: Option<OffsetDateTime>,
    ) -> Result<Vec<Shift>, StoreError> {
        Ok(self.sorted(|s| from.is_none_or(|from| s.start() >= from)))
    }

    fn shifts_spanning(&mut self, at: OffsetDateTime) -> Result<Vec<Shift>, StoreError> {
        Ok(self.sorted(|s| s.start() < at && s.end().is_none_or(|end| end > at)))
    }

    fn set_shift_row(&mut self, shift_id: ShiftId, row: Option<u16>) -> Result<(), StoreError> {
        let shift: &mut Shift = self
            .shifts
            .get_mut(&shift_id)
            .ok_or_else(|| StoreError::Backend(format!("Shift {shift_id} not found")))?;
        shift.set_row(row);
        Ok(())
    }

    fn incomplete_shifts(&mut self) -> Result<Vec<Shift>, StoreError> {
        Ok(self.sorted(Shift::is_open))
    }

    fn latest_live_state(&mut self) -> Result<Option<LiveStateRecord>, StoreError> {
        Ok(self.live_states.last().cloned())
    }

    fn append_live_state(
        &mut self,
        record: &LiveStateRecord,
    ) -> Result<LiveStateRecord, StoreError> {
        let id: LiveStateId = LiveStateId::try_from(self.live_states.len())
            .map_err(|e| StoreError::Backend(e.to_string()))?
            + 1;
        let stored: LiveStateRecord = record.clone().with_id(id);
        self.live_states.push(stored.clone());
        Ok(stored)
    }

    fn last_synced_at(&mut self) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(self.syncs.last().copied())
    }

    fn record_sync(&mut self, at: OffsetDateTime) -> Result<(), StoreError> {
        self.syncs.push(at);
        Ok(())
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attaches components to shifts.

use crate::error::CoreError;
use crate::store::{ReconciliationStore, StoreError};
use time::Duration;
use timeclock_domain::{Component, ComponentId, DomainError, Shift, ShiftId};
use tracing::debug;

/// What the matcher did with one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A known component changed and its shift was recomputed.
    Refreshed(ShiftId),
    /// A known component was seen again without changes.
    Unchanged(ShiftId),
    /// The component joined an existing shift.
    Appended(ShiftId),
    /// The component started a new shift.
    Created(ShiftId),
}

impl MatchOutcome {
    /// Returns the shift the component ended up in.
    #[must_use]
    pub const fn shift_id(&self) -> ShiftId {
        match self {
            Self::Refreshed(id) | Self::Unchanged(id) | Self::Appended(id) | Self::Created(id) => {
                *id
            }
        }
    }
}

/// Stitches components into shifts using the merge threshold.
#[derive(Debug, Clone, Copy)]
pub struct ShiftMatcher {
    merge_threshold: Duration,
}

impl ShiftMatcher {
    /// Creates a matcher that bridges gaps shorter than `merge_threshold`.
    #[must_use]
    pub const fn new(merge_threshold: Duration) -> Self {
        Self { merge_threshold }
    }

    /// Applies one component candidate to the store.
    ///
    /// A known identity is updated in place and its shift recomputed. A new
    /// identity is inserted and attached to the shift that ended most
    /// recently within the merge window, or starts a shift of its own.
    /// Components detached by duplicate resolution go through the same
    /// parent search as new ones. When a known component grows over the
    /// start of a sibling in its shift, that sibling is deleted: upstream
    /// delivered both halves of one split record separately before and now
    /// delivers them collapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, a component references a
    /// missing shift, or a shift's components cannot all be loaded.
    pub fn apply<S: ReconciliationStore + ?Sized>(
        &self,
        store: &mut S,
        candidate: &Component,
    ) -> Result<MatchOutcome, CoreError> {
        let Some(mut existing) = store.find_component(candidate.employee(), candidate.start())?
        else {
            let inserted: Component = store.insert_component(candidate)?;
            return self.attach(store, inserted);
        };

        let component_id: ComponentId = existing
            .component_id()
            .ok_or_else(|| CoreError::DomainViolation(unpersisted(&existing)))?;
        let changed: bool = existing.absorb(candidate);
        if changed {
            store.update_component(&existing)?;
        }

        let Some(shift_id) = existing.shift_id() else {
            debug!(
                employee = %existing.employee(),
                component_id,
                "Re-attaching detached component"
            );
            return self.attach(store, existing);
        };

        let mut shift: Shift = store
            .get_shift(shift_id)?
            .ok_or(CoreError::OrphanedComponent {
                component_id,
                shift_id,
            })?;

        if !changed {
            return Ok(MatchOutcome::Unchanged(shift_id));
        }

        let ids: Vec<ComponentId> =
            drop_covered_siblings(store, &existing, shift_id, shift.component_ids())?;
        refresh_shift(store, &mut shift, shift_id, &ids)?;
        debug!(
            employee = %existing.employee(),
            component_id,
            shift_id,
            "Refreshed shift after component update"
        );
        Ok(MatchOutcome::Refreshed(shift_id))
    }

    fn attach<S: ReconciliationStore + ?Sized>(
        &self,
        store: &mut S,
        mut component: Component,
    ) -> Result<MatchOutcome, CoreError> {
        let component_id: ComponentId = component
            .component_id()
            .ok_or_else(|| CoreError::DomainViolation(unpersisted(&component)))?;

        if let Some(mut parent) = store.find_parent_candidate(
            component.employee(),
            component.start(),
            self.merge_threshold,
        )? && let Some(shift_id) = parent.shift_id()
        {
            component.set_shift_id(Some(shift_id));
            store.update_component(&component)?;

            let mut ids: Vec<ComponentId> = parent.component_ids().to_vec();
            if !ids.contains(&component_id) {
                ids.push(component_id);
            }
            refresh_shift(store, &mut parent, shift_id, &ids)?;
            debug!(
                employee = %component.employee(),
                component_id,
                shift_id,
                "Appended component to shift"
            );
            return Ok(MatchOutcome::Appended(shift_id));
        }

        let shift: Shift = store.insert_shift(&Shift::from_components(std::slice::from_ref(
            &component,
        ))?)?;
        let shift_id: ShiftId = shift.shift_id().ok_or_else(|| {
            CoreError::Store(StoreError::Backend(String::from(
                "Inserted shift has no identifier",
            )))
        })?;
        component.set_shift_id(Some(shift_id));
        store.update_component(&component)?;
        debug!(
            employee = %component.employee(),
            component_id,
            shift_id,
            "Created shift"
        );
        Ok(MatchOutcome::Created(shift_id))
    }
}

/// Deletes the siblings of `component` that start inside its interval and
/// returns the identifiers left in the shift.
fn drop_covered_siblings<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    component: &Component,
    shift_id: ShiftId,
    ids: &[ComponentId],
) -> Result<Vec<ComponentId>, CoreError> {
    let Some(end) = component.end() else {
        return Ok(ids.to_vec());
    };

    let siblings: Vec<Component> = store.get_components(ids)?;
    if siblings.len() != ids.len() {
        return Err(CoreError::MissingComponent {
            shift_id,
            expected: ids.len(),
            found: siblings.len(),
        });
    }

    let mut kept: Vec<ComponentId> = Vec::with_capacity(ids.len());
    for sibling in siblings {
        let Some(sibling_id) = sibling.component_id() else {
            continue;
        };
        if sibling.start() > component.start() && sibling.start() < end {
            store.delete_component(sibling_id)?;
            debug!(
                employee = %sibling.employee(),
                component_id = sibling_id,
                shift_id,
                "Deleted component covered by a wider observation"
            );
            continue;
        }
        kept.push(sibling_id);
    }
    Ok(kept)
}

/// Reloads `ids` and recomputes `shift` from them.
fn refresh_shift<S: ReconciliationStore + ?Sized>(
    store: &mut S,
    shift: &mut Shift,
    shift_id: ShiftId,
    ids: &[ComponentId],
) -> Result<(), CoreError> {
    let components: Vec<Component> = store.get_components(ids)?;
    if components.len() != ids.len() {
        return Err(CoreError::MissingComponent {
            shift_id,
            expected: ids.len(),
            found: components.len(),
        });
    }
    shift.refresh(&components)?;
    store.update_shift(shift)?;
    Ok(())
}

fn unpersisted(component: &Component) -> DomainError {
    DomainError::UnpersistedComponent {
        employee: component.employee().to_string(),
        start: component.start(),
    }
}

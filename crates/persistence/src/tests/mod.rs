// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;

use time::OffsetDateTime;
use timeclock::{ReconciliationStore, StateNotifier};
use timeclock_domain::{Component, EmployeeId, LiveStateDelta, LiveStateRecord, Shift};

use crate::Persistence;

pub fn employee(id: &str) -> EmployeeId {
    EmployeeId::new(id).unwrap()
}

pub fn component(
    employee_id: &str,
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
) -> Component {
    Component::new(employee(employee_id), start, end, vec![1, 2], false).unwrap()
}

/// Persists one component and a shift holding only it.
pub fn persist_single_shift(
    db: &mut Persistence,
    employee_id: &str,
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
) -> (Component, Shift) {
    let mut stored: Component = db
        .insert_component(&component(employee_id, start, end))
        .unwrap();
    let shift: Shift = db
        .insert_shift(&Shift::from_components(std::slice::from_ref(&stored)).unwrap())
        .unwrap();
    stored.set_shift_id(shift.shift_id());
    db.update_component(&stored).unwrap();
    (stored, shift)
}

/// A notifier that ignores every record.
#[derive(Debug, Default)]
pub struct DiscardingNotifier;

impl StateNotifier for DiscardingNotifier {
    fn notify(&self, _record: &LiveStateRecord, _delta: &LiveStateDelta) {}
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod duplicates;
mod error;
mod layout;
mod live_state;

use crate::{Component, ComponentId, EmployeeId, Shift, ShiftId};
use time::OffsetDateTime;

pub fn employee(id: &str) -> EmployeeId {
    EmployeeId::new(id).unwrap()
}

pub fn component(
    component_id: ComponentId,
    employee_id: &str,
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
) -> Component {
    Component::new(employee(employee_id), start, end, vec![component_id], false)
        .unwrap()
        .with_id(component_id)
}

pub fn shift(shift_id: ShiftId, components: &[Component]) -> Shift {
    Shift::from_components(components).unwrap().with_id(shift_id)
}

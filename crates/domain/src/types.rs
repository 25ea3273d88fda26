// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::shift_bounds::ShiftBounds;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Identifier assigned by the upstream attendance source to a single punch.
pub type PunchId = i64;

/// Identifier assigned by the store to a component.
pub type ComponentId = i64;

/// Identifier assigned by the store to a shift.
pub type ShiftId = i64;

/// Normalizes an instant to UTC with whole-second precision.
///
/// Components are keyed by their start instant, so every timestamp entering
/// the domain is normalized to the precision the store keeps.
#[must_use]
pub fn normalize_instant(instant: OffsetDateTime) -> OffsetDateTime {
    let utc: OffsetDateTime = instant.to_offset(UtcOffset::UTC);
    utc - Duration::nanoseconds(i64::from(utc.nanosecond()))
}

/// Represents an upstream employee identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Creates a new `EmployeeId`.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty after trimming.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidEmployeeId(String::from(
                "Employee id must not be empty",
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single clock event as delivered by the upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punch {
    /// The upstream punch identifier.
    pub punch_id: PunchId,
    /// When the punch happened.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Whether the punch was entered by hand rather than at the device.
    pub is_manual: bool,
}

/// A start/possibly-open-end interval for one employee.
///
/// Identity is `(employee, start)`. The end may change as later punches
/// arrive; the start never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Identifier assigned by the store. `None` until persisted.
    component_id: Option<ComponentId>,
    employee: EmployeeId,
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    end: Option<OffsetDateTime>,
    /// Upstream punch identifiers that contributed to this component.
    punches: Vec<PunchId>,
    is_manual: bool,
    /// The shift this component belongs to, if attached.
    shift_id: Option<ShiftId>,
}

impl Component {
    /// Creates a new, unpersisted `Component`.
    ///
    /// # Arguments
    ///
    /// * `employee` - The employee who punched
    /// * `start` - The clock-in instant
    /// * `end` - The clock-out instant, if the employee has clocked out
    /// * `punches` - Upstream punch identifiers
    /// * `is_manual` - Whether any contributing punch was manual
    ///
    /// # Errors
    ///
    /// Returns an error if `end` precedes `start`.
    pub fn new(
        employee: EmployeeId,
        start: OffsetDateTime,
        end: Option<OffsetDateTime>,
        punches: Vec<PunchId>,
        is_manual: bool,
    ) -> Result<Self, DomainError> {
        let start: OffsetDateTime = normalize_instant(start);
        let end: Option<OffsetDateTime> = end.map(normalize_instant);
        if let Some(end) = end
            && end < start
        {
            return Err(DomainError::InvertedInterval { start, end });
        }
        Ok(Self {
            component_id: None,
            employee,
            start,
            end,
            punches,
            is_manual,
            shift_id: None,
        })
    }

    /// Returns this component with a store-assigned identifier.
    #[must_use]
    pub const fn with_id(mut self, component_id: ComponentId) -> Self {
        self.component_id = Some(component_id);
        self
    }

    /// Returns this component attached to a shift.
    #[must_use]
    pub const fn with_shift(mut self, shift_id: Option<ShiftId>) -> Self {
        self.shift_id = shift_id;
        self
    }

    /// Returns the store-assigned identifier, if persisted.
    #[must_use]
    pub const fn component_id(&self) -> Option<ComponentId> {
        self.component_id
    }

    /// Returns the employee.
    #[must_use]
    pub const fn employee(&self) -> &EmployeeId {
        &self.employee
    }

    /// Returns the start instant.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the end instant, if closed.
    #[must_use]
    pub const fn end(&self) -> Option<OffsetDateTime> {
        self.end
    }

    /// Returns the contributing punch identifiers.
    #[must_use]
    pub fn punches(&self) -> &[PunchId] {
        &self.punches
    }

    /// Returns whether any contributing punch was manual.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.is_manual
    }

    /// Returns the parent shift, if attached.
    #[must_use]
    pub const fn shift_id(&self) -> Option<ShiftId> {
        self.shift_id
    }

    /// Returns whether the employee has not clocked out yet.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Returns the elapsed wall-clock duration, if closed.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }

    /// Attaches or detaches this component.
    pub const fn set_shift_id(&mut self, shift_id: Option<ShiftId>) {
        self.shift_id = shift_id;
    }

    /// Folds a later observation of the same identity into this component.
    ///
    /// The observation's end replaces ours and its punches are unioned in.
    /// Returns whether anything changed.
    pub fn absorb(&mut self, observation: &Self) -> bool {
        let mut changed: bool = false;
        if self.end != observation.end {
            self.end = observation.end;
            changed = true;
        }
        for punch in &observation.punches {
            if !self.punches.contains(punch) {
                self.punches.push(*punch);
                changed = true;
            }
        }
        if observation.is_manual && !self.is_manual {
            self.is_manual = true;
            changed = true;
        }
        changed
    }
}

/// Whether a shift has been closed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftState {
    /// The last component has no end yet.
    Incomplete,
    /// The last component has been closed.
    Complete,
}

impl ShiftState {
    /// Converts this state to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Complete => "complete",
        }
    }
}

impl FromStr for ShiftState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incomplete" => Ok(Self::Incomplete),
            "complete" => Ok(Self::Complete),
            _ => Err(DomainError::InvalidShiftState(s.to_string())),
        }
    }
}

impl std::fmt::Display for ShiftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contiguous block of work for one employee.
///
/// A shift references its components by identifier; its boundaries and
/// duration are always derived from the full component set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// Identifier assigned by the store. `None` until persisted.
    shift_id: Option<ShiftId>,
    employee: EmployeeId,
    /// Component identifiers in ascending start order.
    component_ids: Vec<ComponentId>,
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    end: Option<OffsetDateTime>,
    duration: Duration,
    state: ShiftState,
    #[serde(with = "time::serde::rfc3339::option")]
    open_since: Option<OffsetDateTime>,
    /// Display lane, once laid out.
    row: Option<u16>,
}

impl Shift {
    /// Creates a new, unpersisted shift from persisted components.
    ///
    /// # Errors
    ///
    /// Returns an error if `components` is empty, mixes employees, or
    /// contains a component without a store identifier.
    pub fn from_components(components: &[Component]) -> Result<Self, DomainError> {
        let first: &Component = components.first().ok_or(DomainError::EmptyShift)?;
        let mut shift: Self = Self {
            shift_id: None,
            employee: first.employee().clone(),
            component_ids: Vec::new(),
            start: first.start(),
            end: first.end(),
            duration: Duration::ZERO,
            state: ShiftState::Incomplete,
            open_since: None,
            row: None,
        };
        shift.refresh(components)?;
        Ok(shift)
    }

    /// Rebuilds a shift from stored fields.
    ///
    /// Used by store implementations; no recomputation happens here.
    #[must_use]
    pub const fn restore(
        shift_id: ShiftId,
        employee: EmployeeId,
        component_ids: Vec<ComponentId>,
        bounds: ShiftBounds,
        row: Option<u16>,
    ) -> Self {
        Self {
            shift_id: Some(shift_id),
            employee,
            component_ids,
            start: bounds.start,
            end: bounds.end,
            duration: bounds.duration,
            state: bounds.state,
            open_since: bounds.open_since,
            row,
        }
    }

    /// Recomputes the component list, boundaries, duration and state from
    /// the complete set of this shift's components.
    ///
    /// # Errors
    ///
    /// Returns an error if `components` is empty, belongs to another
    /// employee, or contains an unpersisted component.
    pub fn refresh(&mut self, components: &[Component]) -> Result<(), DomainError> {
        let mut ordered: Vec<&Component> = Vec::with_capacity(components.len());
        for component in components {
            if component.employee() != &self.employee {
                return Err(DomainError::MixedEmployees {
                    expected: self.employee.to_string(),
                    found: component.employee().to_string(),
                });
            }
            if component.component_id().is_none() {
                return Err(DomainError::UnpersistedComponent {
                    employee: component.employee().to_string(),
                    start: component.start(),
                });
            }
            ordered.push(component);
        }
        ordered.sort_by_key(|c| (c.start(), c.component_id()));

        let bounds: ShiftBounds = ShiftBounds::compute(&ordered)?;
        self.component_ids = ordered.iter().filter_map(|c| c.component_id()).collect();
        self.start = bounds.start;
        self.end = bounds.end;
        self.duration = bounds.duration;
        self.state = bounds.state;
        self.open_since = bounds.open_since;
        Ok(())
    }

    /// Returns this shift with a store-assigned identifier.
    #[must_use]
    pub const fn with_id(mut self, shift_id: ShiftId) -> Self {
        self.shift_id = Some(shift_id);
        self
    }

    /// Returns the store-assigned identifier, if persisted.
    #[must_use]
    pub const fn shift_id(&self) -> Option<ShiftId> {
        self.shift_id
    }

    /// Returns the employee.
    #[must_use]
    pub const fn employee(&self) -> &EmployeeId {
        &self.employee
    }

    /// Returns the component identifiers in start order.
    #[must_use]
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    /// Returns the start of the first component.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the end of the last component, if closed.
    #[must_use]
    pub const fn end(&self) -> Option<OffsetDateTime> {
        self.end
    }

    /// Returns the cumulative duration of closed components.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the shift state.
    #[must_use]
    pub const fn state(&self) -> ShiftState {
        self.state
    }

    /// Returns the start of the trailing open component, if any.
    #[must_use]
    pub const fn open_since(&self) -> Option<OffsetDateTime> {
        self.open_since
    }

    /// Returns the display lane, if assigned.
    #[must_use]
    pub const fn row(&self) -> Option<u16> {
        self.row
    }

    /// Sets the display lane.
    pub const fn set_row(&mut self, row: Option<u16>) {
        self.row = row;
    }

    /// Returns whether the shift is still running.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, ShiftState::Incomplete)
    }

    /// Returns the duration only once the shift is complete.
    #[must_use]
    pub const fn known_duration(&self) -> Option<Duration> {
        match self.state {
            ShiftState::Complete => Some(self.duration),
            ShiftState::Incomplete => None,
        }
    }

    /// Returns the end, treating an open shift as running until `now`.
    #[must_use]
    pub fn end_or(&self, now: OffsetDateTime) -> OffsetDateTime {
        self.end.unwrap_or(now).max(self.start)
    }

    /// Returns the worked time including a still-running component.
    #[must_use]
    pub fn elapsed(&self, now: OffsetDateTime) -> Duration {
        match self.open_since {
            Some(open_since) if now > open_since => self.duration + (now - open_since),
            _ => self.duration,
        }
    }

    /// Returns whether an open component has run longer than `threshold`.
    #[must_use]
    pub fn is_stuck(&self, now: OffsetDateTime, threshold: Duration) -> bool {
        self.open_since
            .is_some_and(|open_since| now - open_since > threshold)
    }
}

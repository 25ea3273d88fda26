// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Greedy lane assignment for timeline rendering.

use crate::error::DomainError;
use crate::types::{Shift, ShiftId};
use time::{Duration, OffsetDateTime};

/// Tunables for the row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Maximum number of regular lanes.
    pub lane_cap: usize,
    /// Lane given to shifts that ran implausibly long.
    pub overflow_lane: u16,
    /// Elapsed duration above which a shift is sent to the overflow lane.
    pub pathological_duration: Duration,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            lane_cap: 30,
            overflow_lane: 30,
            pathological_duration: Duration::hours(16),
        }
    }
}

/// A lane chosen for one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAssignment {
    /// The shift being placed.
    pub shift_id: ShiftId,
    /// The lane it was placed in.
    pub row: u16,
}

/// Lane occupancy while laying out shifts in start order.
#[derive(Debug, Clone)]
pub struct RowLayout {
    config: LayoutConfig,
    /// End time of the last shift placed in each lane. `None` is free.
    lanes: Vec<Option<OffsetDateTime>>,
}

impl RowLayout {
    /// Creates an empty layout.
    #[must_use]
    pub const fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            lanes: Vec::new(),
        }
    }

    /// Returns the number of regular lanes in use.
    #[must_use]
    pub const fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Marks the lane already held by a shift that started before the
    /// layout window and is still running into it.
    ///
    /// Shifts without a row, or sitting in the overflow lane, are ignored.
    pub fn seed(&mut self, shift: &Shift, now: OffsetDateTime) {
        let Some(row) = shift.row() else {
            return;
        };
        let index: usize = usize::from(row);
        if row == self.config.overflow_lane || index >= self.config.lane_cap {
            return;
        }
        if self.lanes.len() <= index {
            self.lanes.resize(index + 1, None);
        }
        let end: OffsetDateTime = shift.end_or(now);
        self.lanes[index] = Some(self.lanes[index].map_or(end, |held| held.max(end)));
    }

    /// Places a shift in the first free lane.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::LaneCapacityExceeded` if every lane is occupied
    /// and the cap has been reached.
    pub fn place(&mut self, shift: &Shift, now: OffsetDateTime) -> Result<u16, DomainError> {
        if shift.elapsed(now) > self.config.pathological_duration {
            return Ok(self.config.overflow_lane);
        }

        let start: OffsetDateTime = shift.start();
        let end: OffsetDateTime = shift.end_or(now);

        let free: Option<usize> = self
            .lanes
            .iter()
            .position(|lane| lane.is_none_or(|held| held <= start));

        let index: usize = match free {
            Some(index) => index,
            None if self.lanes.len() < self.config.lane_cap => {
                self.lanes.push(None);
                self.lanes.len() - 1
            }
            None => {
                return Err(DomainError::LaneCapacityExceeded {
                    cap: self.config.lane_cap,
                    shift_start: start,
                });
            }
        };

        let row: u16 = u16::try_from(index).map_err(|_| DomainError::LaneCapacityExceeded {
            cap: self.config.lane_cap,
            shift_start: start,
        })?;
        self.lanes[index] = Some(end);
        Ok(row)
    }
}

/// Assigns lanes to `shifts` given the lanes held by `seeds`.
///
/// # Arguments
///
/// * `shifts` - Persisted shifts to lay out
/// * `seeds` - Shifts that started earlier and still hold a lane
/// * `config` - Layout tunables
/// * `now` - The instant open shifts are treated as running until
///
/// # Errors
///
/// Returns `DomainError::LaneCapacityExceeded` if the lanes run out.
pub fn assign_rows(
    shifts: &[Shift],
    seeds: &[Shift],
    config: LayoutConfig,
    now: OffsetDateTime,
) -> Result<Vec<RowAssignment>, DomainError> {
    let mut layout: RowLayout = RowLayout::new(config);
    for seed in seeds {
        layout.seed(seed, now);
    }

    let mut ordered: Vec<&Shift> = shifts.iter().collect();
    ordered.sort_by_key(|s| (s.start(), s.shift_id()));

    let mut assignments: Vec<RowAssignment> = Vec::with_capacity(ordered.len());
    for shift in ordered {
        let row: u16 = layout.place(shift, now)?;
        if let Some(shift_id) = shift.shift_id() {
            assignments.push(RowAssignment { shift_id, row });
        }
    }
    Ok(assignments)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod duplicates;
mod error;
mod layout;
mod live_state;
mod punches;
mod shift_bounds;
mod types;
mod week;

#[cfg(test)]
mod tests;

// Re-export public types
pub use duplicates::find_duplicate_shifts;
pub use error::DomainError;
pub use layout::{LayoutConfig, RowAssignment, RowLayout, assign_rows};
pub use live_state::{LiveStateDelta, LiveStateId, LiveStateRecord, compute_live_state};
pub use punches::{ParsedPunches, PunchParser, RawPunch, RawPunchPair, RejectedPair};
pub use shift_bounds::{MERGE_THRESHOLD, ShiftBounds, within_merge_window};
pub use types::{
    Component, ComponentId, EmployeeId, Punch, PunchId, Shift, ShiftId, ShiftState,
    normalize_instant,
};
pub use week::week_start;

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `components`: Component lookups by identity and identifier
//! - `shifts`: Shift lookups, merge candidates and range scans
//! - `live_state`: Live state history
//! - `sync`: Sync checkpoints

pub mod components;
pub mod live_state;
pub mod shifts;
pub mod sync;

pub use components::{find_component, get_components};
pub use live_state::{latest_live_state, live_state_history};
pub use shifts::{
    find_parent_candidate, get_shift, incomplete_shifts, shifts_in_range,
    shifts_spanning, shifts_starting_at_or_after,
};
pub use sync::last_synced_at;

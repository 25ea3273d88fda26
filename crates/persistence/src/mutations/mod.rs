// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations.
//!
//! ## Module Organization
//!
//! - `components`: Component inserts, updates and deletion
//! - `shifts`: Shift inserts, updates, row assignment and deletion
//! - `live_state`: Live state records and sync checkpoints

pub mod components;
pub mod live_state;
pub mod shifts;

pub use components::{delete_component, insert_component, update_component};
pub use live_state::{append_live_state, record_sync};
pub use shifts::{delete_shift, insert_shift, set_shift_row, update_shift};

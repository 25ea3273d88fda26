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

mod config;
mod error;
mod matcher;
mod memory;
mod notify;
mod passes;
mod reconcile;
mod source;
mod store;
mod window;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use config::EngineConfig;
pub use error::CoreError;
pub use matcher::{MatchOutcome, ShiftMatcher};
pub use memory::InMemoryStore;
pub use notify::StateNotifier;
pub use passes::{layout_rows, resolve_duplicates, snapshot_live_state};
pub use reconcile::{
    CancellationFlag, ReconciliationContext, ReconciliationReport, reconcile,
};
pub use source::{EmployeePunchPairs, PunchSource, SourceError, StaticPunchSource};
pub use store::{ReconciliationStore, StoreError};
pub use window::{ReconciliationWindow, sync_window};

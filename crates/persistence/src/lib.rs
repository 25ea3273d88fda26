// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the timeclock service.
//!
//! This crate stores components, shifts, live state records and sync
//! checkpoints in `SQLite` through Diesel, and implements the
//! reconciliation store used by the engine.
//!
//! ## Storage Layout
//!
//! - `components`: One row per `(employee, start)`; `shift_id` is cleared
//!   by the database when the parent shift is deleted
//! - `shifts`: Derived boundaries, state and display row
//! - `live_states`: Append-only snapshots of who is clocked in
//! - `sync_history`: Instants of successful runs
//!
//! ## Testing Philosophy
//!
//! - Tests run against isolated in-memory databases
//! - File-backed databases use WAL mode
//! - Foreign key enforcement is verified at startup

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
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use timeclock_domain::{EmployeeId, LiveStateRecord, Shift, ShiftId};

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
mod store;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, so tests
/// never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter backed by a single `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Sets how long statements wait on a locked database.
    ///
    /// # Errors
    ///
    /// Returns an error if the PRAGMA statement fails.
    pub fn set_busy_timeout(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<(), PersistenceError> {
        backend::sqlite::set_busy_timeout(&mut self.conn, timeout)
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if enforcement is off.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    /// Returns the most recent live state record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn current_live_state(&mut self) -> Result<Option<LiveStateRecord>, PersistenceError> {
        queries::latest_live_state(&mut self.conn)
    }

    /// Returns up to `limit` live state records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn live_state_history(
        &mut self,
        limit: usize,
    ) -> Result<Vec<LiveStateRecord>, PersistenceError> {
        let limit: i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        queries::live_state_history(&mut self.conn, limit)
    }

    /// Returns shifts overlapping `[min, max)`, optionally for one employee.
    ///
    /// Either bound may be left open.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn shifts_in_range(
        &mut self,
        min: Option<OffsetDateTime>,
        max: Option<OffsetDateTime>,
        employee: Option<&EmployeeId>,
    ) -> Result<Vec<Shift>, PersistenceError> {
        queries::shifts_in_range(&mut self.conn, min, max, employee)
    }

    /// Loads a shift by identifier.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the shift does not exist.
    pub fn shift(&mut self, shift_id: ShiftId) -> Result<Shift, PersistenceError> {
        queries::get_shift(&mut self.conn, shift_id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("Shift {shift_id}")))
    }

    /// Returns the instant of the most recent successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_synced_at(&mut self) -> Result<Option<OffsetDateTime>, PersistenceError> {
        queries::last_synced_at(&mut self.conn)
    }
}

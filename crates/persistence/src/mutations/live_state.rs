// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live state and sync checkpoint mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use timeclock_domain::{LiveStateId, LiveStateRecord};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::diesel_schema::{live_states, sync_history};
use crate::error::PersistenceError;

/// Appends a live state record and returns it with its identifier.
///
/// Records are never updated once written.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn append_live_state(
    conn: &mut SqliteConnection,
    record: &LiveStateRecord,
) -> Result<LiveStateRecord, PersistenceError> {
    let record_json: String = serde_json::to_string(record)?;
    let created_at: String = record
        .created_at()
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

    diesel::insert_into(live_states::table)
        .values((
            live_states::created_at.eq(created_at),
            live_states::record_json.eq(record_json),
        ))
        .execute(conn)?;

    let live_state_id: LiveStateId = get_last_insert_rowid(conn)?;
    Ok(record.clone().with_id(live_state_id))
}

/// Records a successful reconciliation run.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn record_sync(
    conn: &mut SqliteConnection,
    at: OffsetDateTime,
) -> Result<(), PersistenceError> {
    diesel::insert_into(sync_history::table)
        .values(sync_history::synced_at_ts.eq(at.unix_timestamp()))
        .execute(conn)?;
    Ok(())
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Sync checkpoint queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use time::OffsetDateTime;

use crate::data_models::instant_from_ts;
use crate::diesel_schema::sync_history;
use crate::error::PersistenceError;

/// Returns the instant of the most recent successful run.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_synced_at(
    conn: &mut SqliteConnection,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    sync_history::table
        .order(sync_history::sync_id.desc())
        .select(sync_history::synced_at_ts)
        .first::<i64>(conn)
        .optional()?
        .map(instant_from_ts)
        .transpose()
}

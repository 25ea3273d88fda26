// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live state queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use timeclock_domain::LiveStateRecord;

use crate::data_models::LiveStateRow;
use crate::diesel_schema::live_states;
use crate::error::PersistenceError;

/// Returns the most recently appended live state record.
///
/// # Errors
///
/// Returns an error if the query fails or the stored JSON is invalid.
pub fn latest_live_state(
    conn: &mut SqliteConnection,
) -> Result<Option<LiveStateRecord>, PersistenceError> {
    live_states::table
        .order(live_states::live_state_id.desc())
        .select(LiveStateRow::as_select())
        .first::<LiveStateRow>(conn)
        .optional()?
        .map(LiveStateRow::into_domain)
        .transpose()
}

/// Returns up to `limit` records, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or the stored JSON is invalid.
pub fn live_state_history(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<LiveStateRecord>, PersistenceError> {
    live_states::table
        .order(live_states::live_state_id.desc())
        .limit(limit)
        .select(LiveStateRow::as_select())
        .load::<LiveStateRow>(conn)?
        .into_iter()
        .map(LiveStateRow::into_domain)
        .collect()
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use chrono::{Datelike, Days, LocalResult, NaiveDate, TimeZone};
use chrono_tz::Tz;
use time::OffsetDateTime;

/// Returns local midnight of the Sunday on or before `instant` in `zone`.
///
/// When midnight itself is skipped by a DST transition the first valid
/// instant of that day is used. Returns `None` only if the result cannot be
/// represented.
#[must_use]
pub fn week_start(instant: OffsetDateTime, zone: Tz) -> Option<OffsetDateTime> {
    let local = zone.timestamp_opt(instant.unix_timestamp(), 0).single()?;
    let date: NaiveDate = local.date_naive();
    let sunday: NaiveDate =
        date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))?;

    let midnight = (0..24u32).find_map(|hour| {
        let naive = sunday.and_hms_opt(hour, 0, 0)?;
        match zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt),
            LocalResult::None => None,
        }
    })?;

    OffsetDateTime::from_unix_timestamp(midnight.timestamp()).ok()
}

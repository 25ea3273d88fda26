// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use chrono_tz::Tz;
use time::{Duration, OffsetDateTime};
use timeclock_domain::week_start;

/// The half-open interval `[start, end)` a run reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl ReconciliationWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidWindow` unless `start < end`.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, CoreError> {
        if start >= end {
            return Err(CoreError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the inclusive start.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the exclusive end.
    #[must_use]
    pub const fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Splits the window into consecutive chunks of at most `size`.
    ///
    /// A non-positive `size` yields the whole window as one chunk.
    #[must_use]
    pub fn chunks(&self, size: Duration) -> Vec<(OffsetDateTime, OffsetDateTime)> {
        if !size.is_positive() {
            return vec![(self.start, self.end)];
        }
        let mut chunks: Vec<(OffsetDateTime, OffsetDateTime)> = Vec::new();
        let mut cursor: OffsetDateTime = self.start;
        while cursor < self.end {
            let next: OffsetDateTime = (cursor + size).min(self.end);
            chunks.push((cursor, next));
            cursor = next;
        }
        chunks
    }
}

/// Chooses the window for the next scheduled run.
///
/// The window ends at `now`. It starts at local midnight of the Sunday on or
/// before the earlier of `now` and `last_sync`, or at `now - lookback` when
/// no run has succeeded yet.
///
/// # Errors
///
/// Returns `CoreError::InvalidWindow` if the computed start is not before
/// `now`.
pub fn sync_window(
    now: OffsetDateTime,
    last_sync: Option<OffsetDateTime>,
    zone: Tz,
    lookback: Duration,
) -> Result<ReconciliationWindow, CoreError> {
    let start: OffsetDateTime = match last_sync {
        Some(last_sync) => {
            let anchor: OffsetDateTime = last_sync.min(now);
            week_start(anchor, zone).unwrap_or(anchor)
        }
        None => now - lookback,
    };
    ReconciliationWindow::new(start, now)
}

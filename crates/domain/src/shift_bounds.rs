// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shift boundary computation and the merge window rule.

use crate::error::DomainError;
use crate::types::{Component, ShiftState};
use time::{Duration, OffsetDateTime};

/// Maximum gap between one component's end and the next component's start
/// for both to belong to the same shift. The bound is exclusive.
pub const MERGE_THRESHOLD: Duration = Duration::hours(4);

/// Returns whether a component starting at `next_start` continues a shift
/// that ended at `previous_end`.
///
/// The shift must have ended at or before the new start, and the gap must be
/// strictly less than `threshold`.
#[must_use]
pub fn within_merge_window(
    previous_end: OffsetDateTime,
    next_start: OffsetDateTime,
    threshold: Duration,
) -> bool {
    previous_end <= next_start && next_start - previous_end < threshold
}

/// Derived boundaries of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftBounds {
    /// Start of the first component.
    pub start: OffsetDateTime,
    /// End of the last component. `None` while the last component is open.
    pub end: Option<OffsetDateTime>,
    /// Sum of closed component durations.
    pub duration: Duration,
    /// `Complete` iff `end` is known.
    pub state: ShiftState,
    /// Start of the trailing open component.
    pub open_since: Option<OffsetDateTime>,
}

impl ShiftBounds {
    /// Computes the boundaries of a shift from its components.
    ///
    /// # Arguments
    ///
    /// * `components` - The shift's components in ascending start order
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyShift` if `components` is empty.
    pub fn compute(components: &[&Component]) -> Result<Self, DomainError> {
        let first: &Component = components.first().ok_or(DomainError::EmptyShift)?;
        let last: &Component = components.last().ok_or(DomainError::EmptyShift)?;

        let duration: Duration = components
            .iter()
            .filter_map(|c| c.duration())
            .fold(Duration::ZERO, |acc, d| acc + d);

        let end: Option<OffsetDateTime> = last.end();
        let (state, open_since) = match end {
            Some(_) => (ShiftState::Complete, None),
            None => (ShiftState::Incomplete, Some(last.start())),
        };

        Ok(Self {
            start: first.start(),
            end,
            duration,
            state,
            open_since,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_gap_of_exactly_threshold_does_not_merge() {
        let end = datetime!(2026-03-02 12:00 UTC);
        assert!(!within_merge_window(
            end,
            end + Duration::hours(4),
            MERGE_THRESHOLD
        ));
    }

    #[test]
    fn test_gap_just_under_threshold_merges() {
        let end = datetime!(2026-03-02 12:00 UTC);
        let next = end + Duration::hours(4) - Duration::seconds(1);
        assert!(within_merge_window(end, next, MERGE_THRESHOLD));
    }

    #[test]
    fn test_touching_intervals_merge() {
        let end = datetime!(2026-03-02 12:00 UTC);
        assert!(within_merge_window(end, end, MERGE_THRESHOLD));
    }

    #[test]
    fn test_previous_ending_after_start_does_not_merge() {
        let end = datetime!(2026-03-02 12:00 UTC);
        assert!(!within_merge_window(
            end,
            end - Duration::minutes(1),
            MERGE_THRESHOLD
        ));
    }
}

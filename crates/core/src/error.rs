// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::source::SourceError;
use crate::store::StoreError;
use time::OffsetDateTime;
use timeclock_domain::{ComponentId, DomainError, ShiftId};

/// Errors that can abort a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The store failed.
    Store(StoreError),
    /// The punch source failed.
    Source(SourceError),
    /// A component references a shift that does not exist.
    OrphanedComponent {
        /// The component holding the dangling reference.
        component_id: ComponentId,
        /// The missing shift.
        shift_id: ShiftId,
    },
    /// A shift references components that could not all be loaded.
    MissingComponent {
        /// The shift.
        shift_id: ShiftId,
        /// How many components the shift references.
        expected: usize,
        /// How many were found.
        found: usize,
    },
    /// A reconciliation window does not start before it ends.
    InvalidWindow {
        /// The window start.
        start: OffsetDateTime,
        /// The window end.
        end: OffsetDateTime,
    },
    /// The run was cancelled before it completed.
    Cancelled,
}

impl CoreError {
    /// Returns whether retrying the run later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Source(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::Store(err) => write!(f, "Store error: {err}"),
            Self::Source(err) => write!(f, "Punch source error: {err}"),
            Self::OrphanedComponent {
                component_id,
                shift_id,
            } => write!(
                f,
                "Component {component_id} references shift {shift_id} which does not exist"
            ),
            Self::MissingComponent {
                shift_id,
                expected,
                found,
            } => write!(
                f,
                "Shift {shift_id} references {expected} components but only {found} could be loaded"
            ),
            Self::InvalidWindow { start, end } => {
                write!(f, "Reconciliation window [{start}, {end}) is empty")
            }
            Self::Cancelled => write!(f, "Reconciliation run was cancelled"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DomainViolation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Source(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<SourceError> for CoreError {
    fn from(err: SourceError) -> Self {
        Self::Source(err)
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

/// Errors that can occur while constructing or validating domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Employee identifier is empty or invalid.
    InvalidEmployeeId(String),
    /// Shift state string is not recognized.
    InvalidShiftState(String),
    /// A punch timestamp could not be parsed.
    TimestampParseError {
        /// The raw timestamp string.
        value: String,
        /// The parsing error message.
        error: String,
    },
    /// A naive punch timestamp does not exist in the device time zone.
    NonexistentLocalTime {
        /// The raw timestamp string.
        value: String,
        /// The time zone name.
        zone: String,
    },
    /// A punch record has no start punch.
    MissingStartPunch,
    /// A component ends before it starts.
    InvertedInterval {
        /// The component start.
        start: OffsetDateTime,
        /// The component end.
        end: OffsetDateTime,
    },
    /// A shift must contain at least one component.
    EmptyShift,
    /// A component belongs to a different employee than its shift.
    MixedEmployees {
        /// The shift's employee.
        expected: String,
        /// The component's employee.
        found: String,
    },
    /// A component has not been assigned an identifier by the store.
    UnpersistedComponent {
        /// The employee owning the component.
        employee: String,
        /// The component start.
        start: OffsetDateTime,
    },
    /// All display lanes are occupied.
    LaneCapacityExceeded {
        /// The configured lane cap.
        cap: usize,
        /// The start of the shift that could not be placed.
        shift_start: OffsetDateTime,
    },
    /// A live state record holds more than one shift for an employee.
    DuplicateLiveStateEmployee(String),
    /// A live state record holds a shift that is already complete.
    CompleteShiftInLiveState {
        /// The employee owning the shift.
        employee: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmployeeId(msg) => write!(f, "Invalid employee id: {msg}"),
            Self::InvalidShiftState(value) => write!(f, "Invalid shift state: '{value}'"),
            Self::TimestampParseError { value, error } => {
                write!(f, "Failed to parse timestamp '{value}': {error}")
            }
            Self::NonexistentLocalTime { value, zone } => {
                write!(f, "Local time '{value}' does not exist in time zone {zone}")
            }
            Self::MissingStartPunch => write!(f, "Punch record has no start punch"),
            Self::InvertedInterval { start, end } => {
                write!(f, "Component ends at {end} before it starts at {start}")
            }
            Self::EmptyShift => write!(f, "A shift must contain at least one component"),
            Self::MixedEmployees { expected, found } => {
                write!(
                    f,
                    "Component for employee '{found}' cannot join a shift for employee '{expected}'"
                )
            }
            Self::UnpersistedComponent { employee, start } => {
                write!(
                    f,
                    "Component for employee '{employee}' starting at {start} has not been persisted"
                )
            }
            Self::LaneCapacityExceeded { cap, shift_start } => {
                write!(
                    f,
                    "All {cap} display lanes are occupied; \
                     cannot place shift starting at {shift_start}"
                )
            }
            Self::DuplicateLiveStateEmployee(employee) => {
                write!(
                    f,
                    "Live state record holds more than one shift for employee '{employee}'"
                )
            }
            Self::CompleteShiftInLiveState { employee } => {
                write!(
                    f,
                    "Live state record holds a complete shift for employee '{employee}'"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}

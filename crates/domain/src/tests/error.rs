// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::DomainError;
use time::macros::datetime;

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidEmployeeId(String::from("blank"));
    assert_eq!(format!("{err}"), "Invalid employee id: blank");

    let err: DomainError = DomainError::InvalidShiftState(String::from("paused"));
    assert_eq!(format!("{err}"), "Invalid shift state: 'paused'");

    let err: DomainError = DomainError::TimestampParseError {
        value: String::from("yesterday"),
        error: String::from("bad layout"),
    };
    assert_eq!(
        format!("{err}"),
        "Failed to parse timestamp 'yesterday': bad layout"
    );

    let err: DomainError = DomainError::NonexistentLocalTime {
        value: String::from("2026-03-08 02:30:00"),
        zone: String::from("America/New_York"),
    };
    assert_eq!(
        format!("{err}"),
        "Local time '2026-03-08 02:30:00' does not exist in time zone America/New_York"
    );

    let err: DomainError = DomainError::MissingStartPunch;
    assert_eq!(format!("{err}"), "Punch record has no start punch");

    let err: DomainError = DomainError::EmptyShift;
    assert_eq!(
        format!("{err}"),
        "A shift must contain at least one component"
    );

    let err: DomainError = DomainError::MixedEmployees {
        expected: String::from("100"),
        found: String::from("200"),
    };
    assert_eq!(
        format!("{err}"),
        "Component for employee '200' cannot join a shift for employee '100'"
    );

    let err: DomainError = DomainError::DuplicateLiveStateEmployee(String::from("100"));
    assert_eq!(
        format!("{err}"),
        "Live state record holds more than one shift for employee '100'"
    );

    let err: DomainError = DomainError::CompleteShiftInLiveState {
        employee: String::from("100"),
    };
    assert_eq!(
        format!("{err}"),
        "Live state record holds a complete shift for employee '100'"
    );
}

#[test]
fn test_lane_capacity_message_names_cap() {
    let err: DomainError = DomainError::LaneCapacityExceeded {
        cap: 30,
        shift_start: datetime!(2026-03-02 09:00 UTC),
    };
    assert!(format!("{err}").starts_with("All 30 display lanes are occupied"));
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::EmptyShift);
    assert!(err.source().is_none());
}

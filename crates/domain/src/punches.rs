// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Normalization of upstream punch pairs into components.
//!
//! The upstream source delivers one record per clock-in/clock-out pair.
//! Timestamps are either RFC 3339 with an explicit offset or naive wall-clock
//! values in the time zone configured on the punch device.

use crate::error::DomainError;
use crate::types::{Component, EmployeeId, Punch, PunchId};
use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Naive timestamp layouts accepted from the upstream source.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One punch as delivered upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPunch {
    /// The upstream punch identifier.
    pub id: PunchId,
    /// The textual punch timestamp.
    pub original_date: String,
}

/// A clock-in/clock-out record as delivered upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPunchPair {
    /// The clock-in punch.
    pub start_punch: Option<RawPunch>,
    /// The clock-out punch, absent while clocked in.
    pub stop_punch: Option<RawPunch>,
    /// Whether the record was entered by hand.
    #[serde(default)]
    pub is_manual: bool,
}

/// A raw record that could not be turned into a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPair {
    /// Position of the record in the input.
    pub index: usize,
    /// Why it was dropped.
    pub reason: DomainError,
}

/// The result of parsing one employee's punch records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPunches {
    /// Unpersisted components in ascending start order.
    pub components: Vec<Component>,
    /// Records dropped as malformed.
    pub rejected: Vec<RejectedPair>,
}

/// Parses raw punch pairs for one employee into components.
#[derive(Debug, Clone, Copy)]
pub struct PunchParser {
    zone: Tz,
}

impl PunchParser {
    /// Creates a parser that interprets naive timestamps in `zone`.
    #[must_use]
    pub const fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Returns the device time zone.
    #[must_use]
    pub const fn zone(&self) -> Tz {
        self.zone
    }

    /// Parses one upstream timestamp.
    ///
    /// An ambiguous local time resolves to the earlier instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the value matches no accepted layout or names a
    /// local time skipped by a DST transition.
    pub fn parse_timestamp(&self, value: &str) -> Result<OffsetDateTime, DomainError> {
        let value: &str = value.trim();
        if let Ok(instant) = OffsetDateTime::parse(value, &Rfc3339) {
            return Ok(instant);
        }

        let naive: NaiveDateTime = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .ok_or_else(|| DomainError::TimestampParseError {
                value: value.to_string(),
                error: String::from("expected RFC 3339 or YYYY-MM-DD HH:MM:SS"),
            })?;

        let local = match self.zone.from_local_datetime(&naive) {
            LocalResult::Single(local) => local,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                return Err(DomainError::NonexistentLocalTime {
                    value: value.to_string(),
                    zone: self.zone.name().to_string(),
                });
            }
        };

        let nanos: i64 =
            local
                .timestamp_nanos_opt()
                .ok_or_else(|| DomainError::TimestampParseError {
                    value: value.to_string(),
                    error: String::from("timestamp out of range"),
                })?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos)).map_err(|e| {
            DomainError::TimestampParseError {
                value: value.to_string(),
                error: e.to_string(),
            }
        })
    }

    /// Parses one employee's records.
    ///
    /// Malformed records are reported in `rejected` and do not stop parsing.
    /// Records whose end equals the next record's start are collapsed.
    #[must_use]
    pub fn parse(&self, employee: &EmployeeId, pairs: &[RawPunchPair]) -> ParsedPunches {
        let mut parsed: ParsedPunches = ParsedPunches::default();
        let mut candidates: Vec<Component> = Vec::with_capacity(pairs.len());

        for (index, pair) in pairs.iter().enumerate() {
            match self.parse_pair(employee, pair) {
                Ok(component) => candidates.push(component),
                Err(reason) => parsed.rejected.push(RejectedPair { index, reason }),
            }
        }

        candidates.sort_by_key(Component::start);
        parsed.components = collapse_adjacent(candidates);
        parsed
    }

    /// Parses one upstream punch.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be parsed.
    pub fn parse_punch(&self, raw: &RawPunch, is_manual: bool) -> Result<Punch, DomainError> {
        Ok(Punch {
            punch_id: raw.id,
            timestamp: self.parse_timestamp(&raw.original_date)?,
            is_manual,
        })
    }

    fn parse_pair(
        &self,
        employee: &EmployeeId,
        pair: &RawPunchPair,
    ) -> Result<Component, DomainError> {
        let start: Punch = pair
            .start_punch
            .as_ref()
            .ok_or(DomainError::MissingStartPunch)
            .and_then(|raw| self.parse_punch(raw, pair.is_manual))?;
        let stop: Option<Punch> = pair
            .stop_punch
            .as_ref()
            .map(|raw| self.parse_punch(raw, pair.is_manual))
            .transpose()?;

        let mut punches: Vec<PunchId> = vec![start.punch_id];
        punches.extend(stop.map(|p| p.punch_id));

        Component::new(
            employee.clone(),
            start.timestamp,
            stop.map(|p| p.timestamp),
            punches,
            start.is_manual,
        )
    }
}

/// Merges consecutive components where one ends exactly when the next starts.
fn collapse_adjacent(components: Vec<Component>) -> Vec<Component> {
    let mut collapsed: Vec<Component> = Vec::with_capacity(components.len());
    for component in components {
        if let Some(previous) = collapsed.last_mut()
            && previous.end() == Some(component.start())
        {
            previous.absorb(&component);
            continue;
        }
        collapsed.push(component);
    }
    collapsed
}

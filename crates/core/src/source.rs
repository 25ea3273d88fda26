// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;
use timeclock_domain::{EmployeeId, PunchParser, RawPunchPair};

/// Raw punch records for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeePunchPairs {
    /// The employee the records belong to.
    pub employee: EmployeeId,
    /// The records, in upstream order.
    pub pairs: Vec<RawPunchPair>,
}

/// Errors reported by a punch source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot be reached right now.
    Unavailable(String),
    /// The source answered with something unusable.
    Malformed(String),
}

impl SourceError {
    /// Returns whether the failure may clear up on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "Punch source unavailable: {msg}"),
            Self::Malformed(msg) => write!(f, "Punch source returned malformed data: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// The upstream attendance system.
///
/// A source may deliver the same records more than once.
pub trait PunchSource {
    /// Lists the employees known upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    fn employee_ids(&self) -> Result<Vec<EmployeeId>, SourceError>;

    /// Fetches the records of `employees` whose start falls in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be queried.
    fn fetch_punches(
        &self,
        employees: &[EmployeeId],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<EmployeePunchPairs>, SourceError>;
}

/// A punch source backed by a fixed set of records.
///
/// Records whose start cannot be parsed are returned for every window so
/// the engine gets to report them; it reports each one once per run.
#[derive(Debug, Clone)]
pub struct StaticPunchSource {
    parser: PunchParser,
    records: Vec<EmployeePunchPairs>,
}

impl StaticPunchSource {
    /// Creates a source over `records`, reading start times with `parser`.
    #[must_use]
    pub const fn new(parser: PunchParser, records: Vec<EmployeePunchPairs>) -> Self {
        Self { parser, records }
    }

    /// Replaces the records served by this source.
    pub fn set_records(&mut self, records: Vec<EmployeePunchPairs>) {
        self.records = records;
    }

    fn starts_within(
        &self,
        pair: &RawPunchPair,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> bool {
        pair.start_punch
            .as_ref()
            .and_then(|punch| self.parser.parse_timestamp(&punch.original_date).ok())
            .is_none_or(|at| at >= start && at < end)
    }
}

impl PunchSource for StaticPunchSource {
    fn employee_ids(&self) -> Result<Vec<EmployeeId>, SourceError> {
        let mut ids: Vec<EmployeeId> = self.records.iter().map(|r| r.employee.clone()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn fetch_punches(
        &self,
        employees: &[EmployeeId],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<EmployeePunchPairs>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| employees.contains(&r.employee))
            .map(|r| EmployeePunchPairs {
                employee: r.employee.clone(),
                pairs: r
                    .pairs
                    .iter()
                    .filter(|p| self.starts_within(p, start, end))
                    .cloned()
                    .collect(),
            })
            .filter(|r| !r.pairs.is_empty())
            .collect())
    }
}

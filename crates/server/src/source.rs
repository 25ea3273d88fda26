// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! A punch source reading the upstream timecard export from disk.
//!
//! The file holds a JSON array in the upstream shape:
//!
//! ```json
//! [{"EmployeeId": "1042", "Timecards": [
//!     {"StartPunch": {"Id": 1, "OriginalDate": "2026-03-02 09:00:00"},
//!      "StopPunch": null, "IsManual": false}
//! ]}]
//! ```
//!
//! The file is re-read on every call so an external exporter can replace it
//! between runs.

use serde::Deserialize;
use std::path::PathBuf;
use time::OffsetDateTime;
use timeclock::{EmployeePunchPairs, PunchSource, SourceError, StaticPunchSource};
use timeclock_domain::{DomainError, EmployeeId, PunchParser, RawPunchPair};

/// Errors raised while loading the timecard file.
#[derive(Debug, thiserror::Error)]
pub enum FileSourceError {
    /// The file could not be read.
    #[error("failed to read punch file {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid timecard JSON.
    #[error("invalid punch file: {0}")]
    Json(#[from] serde_json::Error),
    /// A record names an unusable employee.
    #[error("invalid employee in punch file: {0}")]
    Employee(#[from] DomainError),
}

impl From<FileSourceError> for SourceError {
    fn from(err: FileSourceError) -> Self {
        match err {
            FileSourceError::Io { .. } => Self::Unavailable(err.to_string()),
            FileSourceError::Json(_) | FileSourceError::Employee(_) => {
                Self::Malformed(err.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmployeeTimecards {
    employee_id: String,
    #[serde(default)]
    timecards: Vec<RawPunchPair>,
}

/// Reads punches from a JSON timecard export.
#[derive(Debug, Clone)]
pub struct FilePunchSource {
    path: PathBuf,
    parser: PunchParser,
}

impl FilePunchSource {
    /// Creates a source over the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, parser: PunchParser) -> Self {
        Self {
            path: path.into(),
            parser,
        }
    }

    /// Loads every record in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Vec<EmployeePunchPairs>, FileSourceError> {
        let contents: String =
            std::fs::read_to_string(&self.path).map_err(|source| FileSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let cards: Vec<EmployeeTimecards> = serde_json::from_str(&contents)?;

        cards
            .into_iter()
            .map(|card| {
                Ok(EmployeePunchPairs {
                    employee: EmployeeId::new(&card.employee_id)?,
                    pairs: card.timecards,
                })
            })
            .collect()
    }

    fn snapshot(&self) -> Result<StaticPunchSource, SourceError> {
        Ok(StaticPunchSource::new(self.parser, self.load()?))
    }
}

impl PunchSource for FilePunchSource {
    fn employee_ids(&self) -> Result<Vec<EmployeeId>, SourceError> {
        self.snapshot()?.employee_ids()
    }

    fn fetch_punches(
        &self,
        employees: &[EmployeeId],
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<EmployeePunchPairs>, SourceError> {
        self.snapshot()?.fetch_punches(employees, start, end)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const SAMPLE: &str = r#"[
        {"EmployeeId": "1042", "Timecards": [
            {"StartPunch": {"Id": 1, "OriginalDate": "2026-03-02 09:00:00"},
             "StopPunch": {"Id": 2, "OriginalDate": "2026-03-02 17:00:00"},
             "IsManual": false},
            {"StartPunch": {"Id": 3, "OriginalDate": "2026-03-10 09:00:00"},
             "StopPunch": null}
        ]},
        {"EmployeeId": " 7 ", "Timecards": []}
    ]"#;

    fn write_sample(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "timeclock_punches_{name}_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn parser() -> PunchParser {
        PunchParser::new(chrono_tz::America::New_York)
    }

    #[test]
    fn test_loads_upstream_shape() {
        let path = write_sample("shape", SAMPLE);
        let source = FilePunchSource::new(&path, parser());

        let records = source.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].employee.value(), "1042");
        assert_eq!(records[0].pairs.len(), 2);
        assert!(records[0].pairs[1].stop_punch.is_none());
        assert_eq!(records[1].employee.value(), "7");

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_fetch_filters_by_window() {
        let path = write_sample("window", SAMPLE);
        let source = FilePunchSource::new(&path, parser());
        let employees = source.employee_ids().unwrap();

        let batches = source
            .fetch_punches(
                &employees,
                datetime!(2026-03-01 00:00 UTC),
                datetime!(2026-03-08 00:00 UTC),
            )
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].pairs.len(), 1);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_is_transient() {
        let source = FilePunchSource::new("/nonexistent/timeclock/punches.json", parser());
        let err = source.employee_ids().unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let path = write_sample("invalid", "{not json");
        let source = FilePunchSource::new(&path, parser());
        let err = source.employee_ids().unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_blank_employee_is_malformed() {
        let path = write_sample("blank", r#"[{"EmployeeId": "  ", "Timecards": []}]"#);
        let source = FilePunchSource::new(&path, parser());
        assert!(matches!(
            source.employee_ids(),
            Err(SourceError::Malformed(_))
        ));

        std::fs::remove_file(path).unwrap();
    }
}

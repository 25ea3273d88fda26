// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    CancellationFlag, CoreError, EmployeePunchPairs, EngineConfig, InMemoryStore,
    ReconciliationContext, ReconciliationReport, ReconciliationWindow, StateNotifier,
    StaticPunchSource, reconcile,
};
use std::cell::RefCell;
use time::OffsetDateTime;
use time::macros::datetime;
use timeclock_domain::{
    Component, EmployeeId, LiveStateDelta, LiveStateRecord, PunchParser, RawPunch, RawPunchPair,
};

pub const WINDOW_START: OffsetDateTime = datetime!(2026-03-01 00:00 UTC);
pub const NOW: OffsetDateTime = datetime!(2026-03-04 00:00 UTC);

pub fn employee(id: &str) -> EmployeeId {
    EmployeeId::new(id).unwrap()
}

pub fn window() -> ReconciliationWindow {
    ReconciliationWindow::new(WINDOW_START, NOW).unwrap()
}

pub fn candidate(
    employee_id: &str,
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
) -> Component {
    Component::new(employee(employee_id), start, end, vec![], false).unwrap()
}

pub fn pair(id: i64, start: &str, stop: Option<&str>) -> RawPunchPair {
    RawPunchPair {
        start_punch: Some(RawPunch {
            id,
            original_date: start.to_string(),
        }),
        stop_punch: stop.map(|date| RawPunch {
            id: id + 1,
            original_date: date.to_string(),
        }),
        is_manual: false,
    }
}

pub fn records(employee_id: &str, pairs: Vec<RawPunchPair>) -> EmployeePunchPairs {
    EmployeePunchPairs {
        employee: employee(employee_id),
        pairs,
    }
}

pub fn source(records: Vec<EmployeePunchPairs>) -> StaticPunchSource {
    StaticPunchSource::new(PunchParser::new(chrono_tz::America::New_York), records)
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub calls: RefCell<Vec<(LiveStateRecord, LiveStateDelta)>>,
}

impl StateNotifier for RecordingNotifier {
    fn notify(&self, record: &LiveStateRecord, delta: &LiveStateDelta) {
        self.calls.borrow_mut().push((record.clone(), delta.clone()));
    }
}

pub fn run_with(
    store: &mut InMemoryStore,
    source: &StaticPunchSource,
    config: EngineConfig,
    cancellation: CancellationFlag,
) -> Result<ReconciliationReport, CoreError> {
    let notifier: RecordingNotifier = RecordingNotifier::default();
    let mut ctx = ReconciliationContext::new(store, config, cancellation)?;
    reconcile(&mut ctx, source, &notifier, window(), NOW)
}

pub fn run(
    store: &mut InMemoryStore,
    source: &StaticPunchSource,
) -> Result<ReconciliationReport, CoreError> {
    run_with(
        store,
        source,
        EngineConfig::default(),
        CancellationFlag::new(),
    )
}

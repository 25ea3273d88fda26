// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::matcher::{MatchOutcome, ShiftMatcher};
use crate::notify::StateNotifier;
use crate::passes::{layout_rows, resolve_duplicates, snapshot_live_state};
use crate::source::{EmployeePunchPairs, PunchSource};
use crate::store::ReconciliationStore;
use crate::window::{ReconciliationWindow, sync_window};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use timeclock_domain::{
    EmployeeId, LiveStateDelta, LiveStateRecord, ParsedPunches, PunchParser, RawPunchPair,
    ShiftId,
};
use tracing::{debug, info, warn};

/// A shared flag that asks a running reconciliation to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        Ok(())
    }
}

/// Everything a reconciliation run needs besides its input.
pub struct ReconciliationContext<'a, S: ReconciliationStore + ?Sized> {
    store: &'a mut S,
    previous: Option<LiveStateRecord>,
    config: EngineConfig,
    cancellation: CancellationFlag,
}

impl<'a, S: ReconciliationStore + ?Sized> ReconciliationContext<'a, S> {
    /// Creates a context, loading the latest live state record from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn new(
        store: &'a mut S,
        config: EngineConfig,
        cancellation: CancellationFlag,
    ) -> Result<Self, CoreError> {
        let previous: Option<LiveStateRecord> = store.latest_live_state()?;
        Ok(Self {
            store,
            previous,
            config,
            cancellation,
        })
    }

    /// Returns the most recent live state record known to this context.
    #[must_use]
    pub const fn previous(&self) -> Option<&LiveStateRecord> {
        self.previous.as_ref()
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Chooses the window for a scheduled run from the last sync checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the window would be empty.
    pub fn scheduled_window(
        &mut self,
        now: OffsetDateTime,
    ) -> Result<ReconciliationWindow, CoreError> {
        let last_sync: Option<OffsetDateTime> = self.store.last_synced_at()?;
        sync_window(now, last_sync, self.config.source_zone, self.config.lookback)
    }
}

/// Counts and results of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// The reconciled window.
    pub window: ReconciliationWindow,
    /// Components that started a new shift.
    pub components_created: usize,
    /// Components that joined an existing shift.
    pub components_appended: usize,
    /// Known components that changed.
    pub components_refreshed: usize,
    /// Known components seen again without changes.
    pub components_unchanged: usize,
    /// Upstream records dropped as malformed.
    pub rejected_records: usize,
    /// Shifts deleted as duplicates.
    pub duplicates_removed: Vec<ShiftId>,
    /// Display rows written.
    pub rows_written: usize,
    /// The appended live state record.
    pub record: LiveStateRecord,
    /// Who clocked in or out since the previous record.
    pub delta: LiveStateDelta,
}

#[derive(Debug, Default)]
struct MatchCounts {
    created: usize,
    appended: usize,
    refreshed: usize,
    unchanged: usize,
    rejected: usize,
}

impl MatchCounts {
    const fn record(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Created(_) => self.created += 1,
            MatchOutcome::Appended(_) => self.appended += 1,
            MatchOutcome::Refreshed(_) => self.refreshed += 1,
            MatchOutcome::Unchanged(_) => self.unchanged += 1,
        }
    }
}

/// Reconciles the punches of `window` into the store and appends a new live
/// state record.
///
/// Punches are fetched in chunks, parsed, and matched per employee in start
/// order. Duplicates are then resolved and rows laid out from the window
/// start. Only when all of that succeeded is the live state record appended,
/// the sync checkpoint recorded and `notifier` called.
///
/// # Arguments
///
/// * `ctx` - The store, previous record, configuration and cancellation flag
/// * `source` - The upstream punch source
/// * `notifier` - Receives the appended record
/// * `window` - The interval to reconcile
/// * `now` - The current instant
///
/// # Errors
///
/// Returns an error if a collaborator fails, a consistency violation is
/// found, or the run is cancelled. No live state record or checkpoint is
/// written in that case.
pub fn reconcile<S, P, N>(
    ctx: &mut ReconciliationContext<'_, S>,
    source: &P,
    notifier: &N,
    window: ReconciliationWindow,
    now: OffsetDateTime,
) -> Result<ReconciliationReport, CoreError>
where
    S: ReconciliationStore + ?Sized,
    P: PunchSource + ?Sized,
    N: StateNotifier + ?Sized,
{
    info!(start = %window.start(), end = %window.end(), "Starting reconciliation run");

    let parser: PunchParser = PunchParser::new(ctx.config.source_zone);
    let matcher: ShiftMatcher = ShiftMatcher::new(ctx.config.merge_threshold);
    let employees: Vec<EmployeeId> = source.employee_ids()?;
    let mut counts: MatchCounts = MatchCounts::default();
    let mut reported: Vec<(EmployeeId, RawPunchPair)> = Vec::new();

    for (chunk_start, chunk_end) in window.chunks(ctx.config.fetch_chunk) {
        let batches: Vec<EmployeePunchPairs> =
            source.fetch_punches(&employees, chunk_start, chunk_end)?;
        debug!(
            start = %chunk_start,
            end = %chunk_end,
            employees = batches.len(),
            "Fetched punch chunk"
        );

        for batch in batches {
            let parsed: ParsedPunches = parser.parse(&batch.employee, &batch.pairs);
            for rejected in &parsed.rejected {
                let Some(pair) = batch.pairs.get(rejected.index) else {
                    continue;
                };
                // Undated records come back with every chunk.
                if reported
                    .iter()
                    .any(|(employee, seen)| employee == &batch.employee && seen == pair)
                {
                    continue;
                }
                reported.push((batch.employee.clone(), pair.clone()));
                warn!(
                    employee = %batch.employee,
                    index = rejected.index,
                    reason = %rejected.reason,
                    "Dropped malformed punch record"
                );
                counts.rejected += 1;
            }

            for component in &parsed.components {
                ctx.cancellation.check()?;
                counts.record(matcher.apply(&mut *ctx.store, component)?);
            }
        }
    }

    let duplicates_removed: Vec<ShiftId> = resolve_duplicates(&mut *ctx.store, window.start())?;
    let rows_written: usize =
        layout_rows(&mut *ctx.store, window.start(), ctx.config.layout, now)?;
    let (record, delta) = snapshot_live_state(&mut *ctx.store, ctx.previous.as_ref(), now)?;

    ctx.cancellation.check()?;
    let record: LiveStateRecord = ctx.store.append_live_state(&record)?;
    ctx.store.record_sync(now)?;
    ctx.previous = Some(record.clone());
    notifier.notify(&record, &delta);

    info!(
        created = counts.created,
        appended = counts.appended,
        refreshed = counts.refreshed,
        unchanged = counts.unchanged,
        rejected = counts.rejected,
        duplicates = duplicates_removed.len(),
        rows = rows_written,
        clocked_in = record.shifts().len(),
        "Reconciliation run complete"
    );

    Ok(ReconciliationReport {
        window,
        components_created: counts.created,
        components_appended: counts.appended,
        components_refreshed: counts.refreshed,
        components_unchanged: counts.unchanged,
        rejected_records: counts.rejected,
        duplicates_removed,
        rows_written,
        record,
        delta,
    })
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Running reconciliation on demand and on a timer.
//!
//! Runs are serialized behind the persistence mutex. Store work is
//! synchronous, so each run executes on the blocking pool.

use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use timeclock::{
    CancellationFlag, CoreError, EngineConfig, PunchSource, ReconciliationContext,
    ReconciliationReport, ReconciliationWindow, reconcile,
};
use timeclock_persistence::Persistence;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::live::LiveStateBroadcaster;

/// Errors from a single run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The engine rejected or aborted the run.
    #[error(transparent)]
    Reconcile(#[from] CoreError),
    /// The blocking task did not complete.
    #[error("reconciliation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RunError {
    /// Returns whether the next attempt may succeed without intervention.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Reconcile(err) => err.is_transient(),
            Self::Join(_) => false,
        }
    }
}

/// Everything a run needs besides the current time.
#[derive(Clone)]
pub struct Reconciler {
    persistence: Arc<Mutex<Persistence>>,
    source: Arc<dyn PunchSource + Send + Sync>,
    broadcaster: Arc<LiveStateBroadcaster>,
    config: EngineConfig,
    cancellation: CancellationFlag,
}

impl Reconciler {
    /// Creates a reconciler over shared collaborators.
    #[must_use]
    pub fn new(
        persistence: Arc<Mutex<Persistence>>,
        source: Arc<dyn PunchSource + Send + Sync>,
        broadcaster: Arc<LiveStateBroadcaster>,
        config: EngineConfig,
        cancellation: CancellationFlag,
    ) -> Self {
        Self {
            persistence,
            source,
            broadcaster,
            config,
            cancellation,
        }
    }

    /// Returns the cancellation flag shared by every run.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Runs one reconciliation over the scheduled sync window.
    ///
    /// # Errors
    ///
    /// Returns an error if the run fails or is cancelled.
    pub async fn run_once(&self) -> Result<ReconciliationReport, RunError> {
        self.run_at(OffsetDateTime::now_utc()).await
    }

    /// Runs one reconciliation as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run fails or is cancelled.
    pub async fn run_at(&self, now: OffsetDateTime) -> Result<ReconciliationReport, RunError> {
        let mut persistence = Arc::clone(&self.persistence).lock_owned().await;
        let source: Arc<dyn PunchSource + Send + Sync> = Arc::clone(&self.source);
        let broadcaster: Arc<LiveStateBroadcaster> = Arc::clone(&self.broadcaster);
        let config: EngineConfig = self.config;
        let cancellation: CancellationFlag = self.cancellation.clone();

        let run = move || -> Result<ReconciliationReport, CoreError> {
            let mut ctx = ReconciliationContext::new(&mut *persistence, config, cancellation)?;
            let window: ReconciliationWindow = ctx.scheduled_window(now)?;
            reconcile(&mut ctx, source.as_ref(), broadcaster.as_ref(), window, now)
        };
        let report: ReconciliationReport = tokio::task::spawn_blocking(run).await??;

        Ok(report)
    }
}

/// Runs reconciliation every `interval` until cancelled.
///
/// A failed run is logged and retried on the next tick only.
pub async fn poll_loop(reconciler: Reconciler, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if reconciler.cancellation().is_cancelled() {
            info!("Poll loop stopping");
            return;
        }

        match reconciler.run_once().await {
            Ok(report) => {
                info!(
                    record_id = ?report.record.record_id(),
                    clocked_in = report.delta.clocked_in.len(),
                    clocked_out = report.delta.clocked_out.len(),
                    "Scheduled reconciliation finished"
                );
            }
            Err(RunError::Reconcile(CoreError::Cancelled)) => {
                info!("Scheduled reconciliation cancelled");
                return;
            }
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Scheduled reconciliation failed, retrying next tick");
            }
            Err(err) => {
                error!(error = %err, "Scheduled reconciliation failed");
            }
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod poll;
mod source;

use axum::{
    Json, Router,
    extract::{FromRef, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono_tz::Tz;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use timeclock::{CancellationFlag, CoreError, EngineConfig, PunchSource, ReconciliationReport};
use timeclock_domain::{EmployeeId, LiveStateRecord, PunchParser, Shift};
use timeclock_persistence::{Persistence, PersistenceError};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::live::{LiveStateBroadcaster, live_state_handler};
use crate::poll::{Reconciler, RunError, poll_loop};
use crate::source::FilePunchSource;

/// Number of records returned by `/state/history` when no limit is given.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Timeclock server - reconciles punches into shifts and serves live state
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "TIMECLOCK_DATABASE")]
    database: Option<PathBuf>,

    /// Path to the JSON timecard export to reconcile
    #[arg(long, env = "TIMECLOCK_PUNCH_FILE")]
    punch_file: PathBuf,

    /// IANA time zone of the punch devices
    #[arg(
        long,
        env = "TIMECLOCK_ZONE",
        default_value = "America/New_York",
        value_parser = parse_zone
    )]
    zone: Tz,

    /// Seconds between scheduled reconciliation runs. Zero disables polling.
    #[arg(long, env = "TIMECLOCK_POLL_INTERVAL", default_value_t = 3600)]
    poll_interval: u64,

    /// Days reached back by the first run
    #[arg(long, env = "TIMECLOCK_LOOKBACK_DAYS", default_value_t = 365)]
    lookback_days: i64,

    /// Milliseconds a statement waits on a locked database
    #[arg(long, env = "TIMECLOCK_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    busy_timeout_ms: u64,

    /// Address to bind the server to
    #[arg(long, env = "TIMECLOCK_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, env = "TIMECLOCK_PORT", default_value_t = 3000)]
    port: u16,
}

fn parse_zone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|e| format!("unknown time zone {value}: {e}"))
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The store, shared with reconciliation runs.
    persistence: Arc<Mutex<Persistence>>,
    /// Fan-out of appended live state records.
    broadcaster: Arc<LiveStateBroadcaster>,
    /// Runs reconciliation on demand.
    reconciler: Reconciler,
    /// How long an open component may run before its shift is flagged.
    stuck_threshold: Duration,
}

impl FromRef<AppState> for Arc<LiveStateBroadcaster> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.broadcaster)
    }
}

/// Query parameters for the live state history.
#[derive(Debug, Deserialize)]
struct HistoryQuery {
    /// Maximum number of records to return.
    limit: Option<usize>,
}

/// Query parameters for listing shifts.
#[derive(Debug, Deserialize)]
struct ShiftsQuery {
    /// Inclusive lower bound (RFC 3339).
    min_date: Option<String>,
    /// Exclusive upper bound (RFC 3339).
    max_date: Option<String>,
    /// Restricts the result to one employee.
    employee: Option<String>,
}

/// A shift as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShiftResponse {
    shift_id: Option<i64>,
    employee_id: String,
    component_ids: Vec<i64>,
    #[serde(with = "time::serde::rfc3339")]
    start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    end: Option<OffsetDateTime>,
    /// Sum of closed component durations, in seconds.
    duration_secs: i64,
    state: String,
    #[serde(with = "time::serde::rfc3339::option")]
    open_since: Option<OffsetDateTime>,
    row: Option<u16>,
    /// Whether the open component has run implausibly long.
    stuck: bool,
}

/// A live state record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LiveStateResponse {
    record_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    shifts: Vec<ShiftResponse>,
}

/// Summary of a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReconcileResponse {
    #[serde(with = "time::serde::rfc3339")]
    window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    window_end: OffsetDateTime,
    components_created: usize,
    components_appended: usize,
    components_refreshed: usize,
    components_unchanged: usize,
    rejected_records: usize,
    duplicates_removed: Vec<i64>,
    rows_written: usize,
    record_id: Option<i64>,
    clocked_in: Vec<String>,
    clocked_out: Vec<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl HttpError {
    const fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<PersistenceError> for HttpError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            PersistenceError::DatabaseBusy(_) => {
                warn!(error = %err, "Database busy");
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: format!("Persistence error: {err}"),
                }
            }
            _ => {
                error!(error = %err, "Persistence error");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("Persistence error: {err}"),
                }
            }
        }
    }
}

impl From<RunError> for HttpError {
    fn from(err: RunError) -> Self {
        let status: StatusCode = match &err {
            RunError::Reconcile(CoreError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            RunError::Reconcile(CoreError::InvalidWindow { .. }) => StatusCode::BAD_REQUEST,
            _ if err.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %err, "Reconciliation failed");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Converts a `Shift` to a `ShiftResponse`.
fn shift_to_response(
    shift: &Shift,
    now: OffsetDateTime,
    stuck_threshold: Duration,
) -> ShiftResponse {
    ShiftResponse {
        shift_id: shift.shift_id(),
        employee_id: shift.employee().to_string(),
        component_ids: shift.component_ids().to_vec(),
        start: shift.start(),
        end: shift.end(),
        duration_secs: shift.duration().whole_seconds(),
        state: shift.state().to_string(),
        open_since: shift.open_since(),
        row: shift.row(),
        stuck: shift.is_stuck(now, stuck_threshold),
    }
}

/// Converts a `LiveStateRecord` to a `LiveStateResponse`.
fn record_to_response(
    record: &LiveStateRecord,
    now: OffsetDateTime,
    stuck_threshold: Duration,
) -> LiveStateResponse {
    LiveStateResponse {
        record_id: record.record_id(),
        created_at: record.created_at(),
        shifts: record
            .shifts()
            .iter()
            .map(|s| shift_to_response(s, now, stuck_threshold))
            .collect(),
    }
}

/// Converts a `ReconciliationReport` to a `ReconcileResponse`.
fn report_to_response(report: &ReconciliationReport) -> ReconcileResponse {
    ReconcileResponse {
        window_start: report.window.start(),
        window_end: report.window.end(),
        components_created: report.components_created,
        components_appended: report.components_appended,
        components_refreshed: report.components_refreshed,
        components_unchanged: report.components_unchanged,
        rejected_records: report.rejected_records,
        duplicates_removed: report.duplicates_removed.clone(),
        rows_written: report.rows_written,
        record_id: report.record.record_id(),
        clocked_in: report.delta.clocked_in.iter().map(ToString::to_string).collect(),
        clocked_out: report.delta.clocked_out.iter().map(ToString::to_string).collect(),
    }
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<OffsetDateTime>, HttpError> {
    value
        .map(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|e| HttpError::bad_request(format!("Invalid {name} '{raw}': {e}")))
        })
        .transpose()
}

/// Handler for GET /state/current endpoint.
///
/// Returns the latest live state record.
async fn handle_get_current_state(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<LiveStateResponse>, HttpError> {
    info!("Handling get_current_state request");

    let mut persistence = app_state.persistence.lock().await;
    let record: Option<LiveStateRecord> = persistence.current_live_state()?;
    drop(persistence);

    let record: LiveStateRecord = record.ok_or_else(|| HttpError {
        status: StatusCode::NOT_FOUND,
        message: String::from("No live state has been recorded yet"),
    })?;

    Ok(Json(record_to_response(
        &record,
        OffsetDateTime::now_utc(),
        app_state.stuck_threshold,
    )))
}

/// Handler for GET /state/history endpoint.
///
/// Returns the most recent live state records, newest first.
async fn handle_get_state_history(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<LiveStateResponse>>, HttpError> {
    let limit: usize = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    info!(limit, "Handling get_state_history request");

    let mut persistence = app_state.persistence.lock().await;
    let records: Vec<LiveStateRecord> = persistence.live_state_history(limit)?;
    drop(persistence);

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    Ok(Json(
        records
            .iter()
            .map(|r| record_to_response(r, now, app_state.stuck_threshold))
            .collect(),
    ))
}

/// Handler for GET /shifts endpoint.
///
/// Returns shifts overlapping the requested range, ordered by start.
async fn handle_list_shifts(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<ShiftsQuery>,
) -> Result<Json<Vec<ShiftResponse>>, HttpError> {
    info!(
        min_date = ?params.min_date,
        max_date = ?params.max_date,
        employee = ?params.employee,
        "Handling list_shifts request"
    );

    let min: Option<OffsetDateTime> = parse_bound("min_date", params.min_date.as_deref())?;
    let max: Option<OffsetDateTime> = parse_bound("max_date", params.max_date.as_deref())?;
    let employee: Option<EmployeeId> = params
        .employee
        .as_deref()
        .map(EmployeeId::new)
        .transpose()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mut persistence = app_state.persistence.lock().await;
    let shifts: Vec<Shift> = persistence.shifts_in_range(min, max, employee.as_ref())?;
    drop(persistence);

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    Ok(Json(
        shifts
            .iter()
            .map(|s| shift_to_response(s, now, app_state.stuck_threshold))
            .collect(),
    ))
}

/// Handler for POST /reconcile endpoint.
///
/// Runs one reconciliation over the scheduled sync window.
async fn handle_reconcile(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<ReconcileResponse>, HttpError> {
    info!("Handling reconcile request");

    let report: ReconciliationReport = app_state.reconciler.run_once().await?;
    Ok(Json(report_to_response(&report)))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/state/current", get(handle_get_current_state))
        .route("/state/history", get(handle_get_state_history))
        .route("/shifts", get(handle_list_shifts))
        .route("/reconcile", post(handle_reconcile))
        .route("/live", get(live_state_handler))
        .with_state(app_state)
}

/// Builds the shared state around an opened store and a punch source.
///
/// # Errors
///
/// Returns an error if the latest live state cannot be loaded.
async fn build_app_state(
    persistence: Persistence,
    source: Arc<dyn PunchSource + Send + Sync>,
    config: EngineConfig,
    cancellation: CancellationFlag,
) -> Result<AppState, PersistenceError> {
    let persistence: Arc<Mutex<Persistence>> = Arc::new(Mutex::new(persistence));
    let latest: Option<LiveStateRecord> = persistence.lock().await.current_live_state()?;
    let broadcaster: Arc<LiveStateBroadcaster> = Arc::new(LiveStateBroadcaster::new(latest));

    let reconciler: Reconciler = Reconciler::new(
        Arc::clone(&persistence),
        source,
        Arc::clone(&broadcaster),
        config,
        cancellation,
    );

    Ok(AppState {
        persistence,
        broadcaster,
        reconciler,
        stuck_threshold: config.stuck_threshold,
    })
}

/// Resolves once the process is asked to stop, then cancels running work.
async fn shutdown_signal(cancellation: CancellationFlag) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown requested");
    cancellation.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing timeclock server");

    let mut persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path.display());
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };
    persistence.set_busy_timeout(std::time::Duration::from_millis(args.busy_timeout_ms))?;

    let config: EngineConfig = EngineConfig {
        source_zone: args.zone,
        lookback: Duration::days(args.lookback_days),
        ..EngineConfig::default()
    };
    info!(
        punch_file = %args.punch_file.display(),
        zone = %args.zone,
        "Reading punches from file"
    );
    let source: Arc<dyn PunchSource + Send + Sync> = Arc::new(FilePunchSource::new(
        args.punch_file.clone(),
        PunchParser::new(args.zone),
    ));

    let cancellation: CancellationFlag = CancellationFlag::new();
    let app_state: AppState =
        build_app_state(persistence, source, config, cancellation.clone()).await?;

    if args.poll_interval > 0 {
        info!(interval_secs = args.poll_interval, "Starting poll loop");
        tokio::spawn(poll_loop(
            app_state.reconciler.clone(),
            std::time::Duration::from_secs(args.poll_interval),
        ));
    }

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation))
        .await?;

    Ok(())
}

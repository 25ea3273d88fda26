// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live state streaming for dashboards.
//!
//! Every appended live state record is fanned out to WebSocket clients.
//!
//! # Delivery
//!
//! - A client first receives a snapshot of the latest record, then each
//!   later append in order
//! - Appends already covered by the snapshot are skipped
//! - A client that falls behind the buffer gets a fresh snapshot instead of
//!   the appends it missed
//! - Nothing is accepted from clients

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timeclock::StateNotifier;
use timeclock_domain::{LiveStateDelta, LiveStateId, LiveStateRecord};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

/// Maximum number of appends buffered per subscriber.
const EVENT_BUFFER_SIZE: usize = 100;

/// A message sent to live state subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveStateMessage {
    /// The full latest record.
    Snapshot {
        /// The record.
        record: LiveStateRecord,
    },
    /// A newly appended record.
    Append {
        /// The record.
        record: LiveStateRecord,
        /// Who clocked in or out since the previous record.
        delta: LiveStateDelta,
    },
}

#[derive(Debug, Clone)]
struct Appended {
    record: LiveStateRecord,
    delta: LiveStateDelta,
}

/// Fans appended live state records out to subscribers.
#[derive(Debug)]
pub struct LiveStateBroadcaster {
    tx: broadcast::Sender<Appended>,
    latest: watch::Sender<Option<LiveStateRecord>>,
}

impl LiveStateBroadcaster {
    /// Creates a broadcaster seeded with the latest stored record.
    #[must_use]
    pub fn new(latest: Option<LiveStateRecord>) -> Self {
        Self::with_capacity(latest, EVENT_BUFFER_SIZE)
    }

    /// Creates a broadcaster buffering `capacity` appends per subscriber.
    #[must_use]
    pub fn with_capacity(latest: Option<LiveStateRecord>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        let (latest, _latest_rx) = watch::channel(latest);
        Self { tx, latest }
    }

    /// Subscribes to the stream.
    ///
    /// The first message is a snapshot of the latest record, if any.
    #[must_use]
    pub fn subscribe(&self) -> LiveSubscription {
        LiveSubscription {
            rx: self.tx.subscribe(),
            latest: self.latest.subscribe(),
            covered: None,
            needs_snapshot: true,
        }
    }

    /// Returns the number of connected subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl StateNotifier for LiveStateBroadcaster {
    fn notify(&self, record: &LiveStateRecord, delta: &LiveStateDelta) {
        self.latest.send_replace(Some(record.clone()));
        let appended: Appended = Appended {
            record: record.clone(),
            delta: delta.clone(),
        };
        match self.tx.send(appended) {
            Ok(count) => {
                debug!(record_id = ?record.record_id(), receivers = count, "Broadcast live state");
            }
            Err(_) => {
                debug!(record_id = ?record.record_id(), "No receivers for live state");
            }
        }
    }
}

/// One subscriber's view of the stream.
#[derive(Debug)]
pub struct LiveSubscription {
    rx: broadcast::Receiver<Appended>,
    latest: watch::Receiver<Option<LiveStateRecord>>,
    /// Highest record id already delivered.
    covered: Option<LiveStateId>,
    needs_snapshot: bool,
}

impl LiveSubscription {
    /// Waits for the next message.
    ///
    /// Returns `None` once the broadcaster is gone.
    pub async fn next(&mut self) -> Option<LiveStateMessage> {
        loop {
            if self.needs_snapshot {
                self.needs_snapshot = false;
                let snapshot: Option<LiveStateRecord> = self.latest.borrow().clone();
                if let Some(record) = snapshot {
                    self.covered = record.record_id();
                    return Some(LiveStateMessage::Snapshot { record });
                }
            }

            match self.rx.recv().await {
                Ok(appended) => {
                    let id: Option<LiveStateId> = appended.record.record_id();
                    if let (Some(id), Some(covered)) = (id, self.covered)
                        && id <= covered
                    {
                        continue;
                    }
                    self.covered = id;
                    return Some(LiveStateMessage::Append {
                        record: appended.record,
                        delta: appended.delta,
                    });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live state subscriber fell behind, resending snapshot");
                    self.needs_snapshot = true;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Upgrades the connection to a WebSocket streaming live state.
///
/// # Arguments
///
/// * `ws` - WebSocket upgrade request
/// * `broadcaster` - The live state broadcaster from application state
///
/// # Returns
///
/// An HTTP response that upgrades the connection to WebSocket
pub async fn live_state_handler(
    ws: WebSocketUpgrade,
    AxumState(broadcaster): AxumState<Arc<LiveStateBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

/// Streams live state to one client until either side goes away.
async fn handle_socket(socket: WebSocket, broadcaster: Arc<LiveStateBroadcaster>) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription: LiveSubscription = broadcaster.subscribe();
    info!(
        subscribers = broadcaster.subscriber_count(),
        "Client connected to live state stream"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(?e, "Failed to serialize live state message");
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Received unexpected message from client, ignoring");
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Receive task completed");
            send_task.abort();
        }
    }

    info!("Client disconnected from live state stream");
}

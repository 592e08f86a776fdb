//! Fire-and-forget forwarding of playback updates to trip persistence.
//!
//! The controller only ever pushes onto an unbounded channel. A background
//! task drains it in order and talks to the backend, so a slow or failing
//! backend can never stall or alter playback.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ride_sim_route::{TripIdentifier, Waypoint};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::controller::{PlaybackController, PlaybackStatus, PlaybackUpdate};
use crate::heading::Compass;
use crate::types::Money;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Persistence call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Update rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Record sent to the trip persistence backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TripUpdate {
    pub trip_id: TripIdentifier,
    pub position: Waypoint,
    pub heading: f64,
    pub compass: Compass,
    pub status: PlaybackStatus,
    pub fare: Money,
    pub recorded_at: DateTime<Utc>,
}

impl TripUpdate {
    pub fn from_playback(trip_id: TripIdentifier, update: &PlaybackUpdate) -> Self {
        Self {
            trip_id,
            position: update.position,
            heading: update.heading,
            compass: update.compass,
            status: update.status,
            fare: update.fare,
            recorded_at: Utc::now(),
        }
    }
}

/// Trip persistence backend. Retries, if any, belong to the implementation.
pub trait TripPersistence: Send + Sync {
    fn persist<'a>(
        &'a self,
        update: &'a TripUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), PersistError>> + Send + 'a>>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct PositionSink {
    trip_id: TripIdentifier,
    tx: mpsc::UnboundedSender<TripUpdate>,
}

impl PositionSink {
    /// Start the delivery task. Must be called from within a Tokio runtime.
    ///
    /// The returned handle resolves once every `PositionSink` clone has been
    /// dropped and the queue is drained.
    pub fn spawn(
        trip_id: TripIdentifier,
        persistence: Arc<dyn TripPersistence>,
        call_timeout: Duration,
    ) -> (Self, JoinHandle<SinkStats>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(deliver(persistence, rx, call_timeout));

        (Self { trip_id, tx }, handle)
    }

    pub fn trip_id(&self) -> &TripIdentifier {
        &self.trip_id
    }

    /// Queue an update without waiting for the backend
    pub fn notify(&self, update: &PlaybackUpdate) {
        let record = TripUpdate::from_playback(self.trip_id.clone(), update);

        if self.tx.send(record).is_err() {
            warn!(trip_id = %self.trip_id, "persistence worker gone, dropping update");
        }
    }

    /// Wire this sink to the controller's persist subscription
    pub fn attach(self, controller: &mut PlaybackController) {
        controller.on_persist(move |update| self.notify(update));
    }
}

async fn deliver(
    persistence: Arc<dyn TripPersistence>,
    mut rx: mpsc::UnboundedReceiver<TripUpdate>,
    call_timeout: Duration,
) -> SinkStats {
    let mut stats = SinkStats::default();

    while let Some(update) = rx.recv().await {
        let result = tokio::time::timeout(call_timeout, persistence.persist(&update))
            .await
            .unwrap_or(Err(PersistError::Timeout(call_timeout)));

        match result {
            Ok(()) => stats.delivered += 1,
            Err(err) => {
                stats.failed += 1;
                warn!(
                    trip_id = %update.trip_id,
                    status = %update.status,
                    %err,
                    "failed to persist trip update"
                );
            }
        }
    }

    debug!(
        delivered = stats.delivered,
        failed = stats.failed,
        "persistence worker finished"
    );
    stats
}

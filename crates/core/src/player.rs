//! Timer-driven playback.
//!
//! [`Player`] shares one [`PlaybackController`] between the caller and a
//! Tokio ticker task. Every tick, and every control call, takes the same
//! lock, and the ticker only ticks while its [`RunId`] is still the active
//! one. Once `stop()` or `reset()` returns, no further tick can land.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use ride_sim_route::Route;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::PlaybackConfig;
use crate::controller::{
    PlaybackController, PlaybackError, PlaybackState, PlaybackUpdate, RunId, StartOutcome,
};
use crate::fare::FareState;
use crate::types::Money;

#[derive(Clone)]
pub struct Player {
    controller: Arc<Mutex<PlaybackController>>,
    period: Duration,
}

impl Player {
    pub fn new(controller: PlaybackController, period: Duration) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            period,
        }
    }

    pub fn from_config(config: &PlaybackConfig, base_fare: Money) -> Self {
        Self::new(
            PlaybackController::new(config, base_fare),
            config.tick_period(),
        )
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run `f` against the controller under the playback lock.
    ///
    /// Used for subscriptions and inspection; `f` must not call back into
    /// this player.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut PlaybackController) -> R) -> R {
        f(&mut lock(&self.controller))
    }

    pub fn set_route(&self, route: Arc<Route>) {
        lock(&self.controller).set_route(route);
    }

    pub fn set_base_fare(&self, base_fare: Money) -> bool {
        lock(&self.controller).set_base_fare(base_fare)
    }

    /// Start playback and its ticker. Must be called from within a Tokio runtime.
    ///
    /// Calling this while a run is active returns that run and spawns nothing.
    pub fn start(&self) -> Result<RunId, PlaybackError> {
        let outcome = lock(&self.controller).start()?;

        if let StartOutcome::Started(run) = outcome {
            tokio::spawn(run_ticker(Arc::downgrade(&self.controller), run, self.period));
        }

        Ok(outcome.run_id())
    }

    pub fn pause(&self) {
        lock(&self.controller).pause();
    }

    pub fn resume(&self) {
        lock(&self.controller).resume();
    }

    pub fn stop(&self) {
        lock(&self.controller).stop();
    }

    pub fn reset(&self) {
        lock(&self.controller).reset();
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.controller).state()
    }

    pub fn fare(&self) -> FareState {
        lock(&self.controller).fare()
    }

    pub fn current_fare(&self) -> Money {
        lock(&self.controller).current_fare()
    }

    pub fn snapshot(&self) -> Option<PlaybackUpdate> {
        lock(&self.controller).snapshot()
    }
}

fn lock(controller: &Mutex<PlaybackController>) -> MutexGuard<'_, PlaybackController> {
    // A panicking observer must not wedge playback for good.
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ticker(controller: Weak<Mutex<PlaybackController>>, run: RunId, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(controller) = controller.upgrade() else {
            break;
        };

        if !lock(&controller).tick_for(run) {
            break;
        }
    }

    debug!(?run, "ticker exited");
}

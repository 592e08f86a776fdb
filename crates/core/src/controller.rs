//! Tick-driven playback state machine.
//!
//! The controller owns the active route, the playback cursor and the fare
//! policy. Nothing else mutates them; observers only ever see a
//! [`PlaybackUpdate`] snapshot.
//!
//! ```text
//! Idle -> Running <-> Paused -> Completed
//!         Running | Paused -> Stopped
//!         any -> Idle (reset)
//! ```

use std::sync::Arc;

use ride_sim_route::{Route, Waypoint, bearing_between};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, error, info, trace, warn};

use crate::config::PlaybackConfig;
use crate::fare::{CostAccrualPolicy, FareState};
use crate::heading::{Compass, bearing_to_compass, normalize_degrees};
use crate::types::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl PlaybackStatus {
    /// A run is in flight and owns the tick scheduler
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackStatus::Running | PlaybackStatus::Paused)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub cursor: usize,
    /// Raw bearing of the last non-degenerate step, in `[0, 360)`
    pub heading: f64,
    pub compass: Compass,
}

/// Read-only snapshot handed to renderers and persistence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlaybackUpdate {
    pub position: Waypoint,
    pub cursor: usize,
    pub heading: f64,
    pub compass: Compass,
    pub status: PlaybackStatus,
    pub fare: Money,
}

/// Identifies one `start()`..terminal span so a scheduler can tell whether
/// it is still the one allowed to tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started(RunId),
    /// Already running or paused; no second run was created.
    AlreadyActive(RunId),
}

impl StartOutcome {
    pub fn run_id(&self) -> RunId {
        match self {
            StartOutcome::Started(run) | StartOutcome::AlreadyActive(run) => *run,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("No route loaded")]
    EmptyRoute,
}

pub type Observer = Box<dyn Fn(&PlaybackUpdate) + Send>;

pub struct PlaybackController {
    route: Option<Arc<Route>>,
    state: PlaybackState,
    fare: CostAccrualPolicy,

    active_run: Option<RunId>,
    runs_started: u64,

    update_observers: Vec<Observer>,
    persist_observers: Vec<Observer>,
}

impl PlaybackController {
    pub fn new(config: &PlaybackConfig, base_fare: Money) -> Self {
        Self {
            route: None,
            state: PlaybackState::default(),
            fare: CostAccrualPolicy::from_config(base_fare, config),
            active_run: None,
            runs_started: 0,
            update_observers: Vec::new(),
            persist_observers: Vec::new(),
        }
    }

    /// Subscribe a renderer.
    ///
    /// Observers run synchronously inside the tick and must not call back
    /// into the controller.
    pub fn on_update(&mut self, observer: impl Fn(&PlaybackUpdate) + Send + 'static) {
        self.update_observers.push(Box::new(observer));
    }

    /// Subscribe the persistence side, normally a [`crate::sink::PositionSink`]
    pub fn on_persist(&mut self, observer: impl Fn(&PlaybackUpdate) + Send + 'static) {
        self.persist_observers.push(Box::new(observer));
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn fare(&self) -> FareState {
        self.fare.state()
    }

    pub fn current_fare(&self) -> Money {
        self.fare.current_fare()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active_run
    }

    /// Current position and state, if a route is loaded
    pub fn snapshot(&self) -> Option<PlaybackUpdate> {
        self.current_position().map(|position| self.update_at(position))
    }

    /// Replace the active route.
    ///
    /// Loading the same `Arc` again is a no-op. Any other route cancels an
    /// in-flight run as `stop()` would, then returns the controller to Idle.
    pub fn set_route(&mut self, route: Arc<Route>) {
        if let Some(current) = &self.route {
            if Arc::ptr_eq(current, &route) {
                return;
            }
        }

        if self.state.status.is_active() {
            warn!(
                cursor = self.state.cursor,
                "route replaced during playback, cancelling run"
            );
            self.stop();
        }

        self.reset();
        debug!(
            waypoints = route.waypoint_count(),
            segments = route.length(),
            "route loaded"
        );
        self.route = Some(route);
    }

    /// Fix the base fare for the next run. Ignored while a run is active.
    pub fn set_base_fare(&mut self, base_fare: Money) -> bool {
        if self.state.status.is_active() {
            warn!(%base_fare, "base fare is fixed while a run is active");
            return false;
        }

        self.fare.set_base_fare(base_fare);
        true
    }

    pub fn start(&mut self) -> Result<StartOutcome, PlaybackError> {
        let (waypoints, origin) = match &self.route {
            Some(route) => (route.waypoint_count(), route.origin()),
            None => return Err(PlaybackError::EmptyRoute),
        };

        if let Some(run) = self.active_run {
            debug!(status = %self.state.status, "start ignored, run already active");
            return Ok(StartOutcome::AlreadyActive(run));
        }

        self.runs_started += 1;
        let run = RunId(self.runs_started);

        self.active_run = Some(run);
        self.state = PlaybackState {
            status: PlaybackStatus::Running,
            ..Default::default()
        };
        self.fare.clear_paused();

        info!(
            run = run.0,
            waypoints,
            base_fare = %self.fare.base_fare(),
            "playback started"
        );
        self.emit(origin);

        Ok(StartOutcome::Started(run))
    }

    /// Advance one simulated second. Never fails; misuse is a no-op.
    pub fn tick(&mut self) {
        match self.state.status {
            PlaybackStatus::Running => self.step(),
            PlaybackStatus::Paused => {
                if let Some(surcharge) = self.fare.accumulate_paused_second() {
                    info!(
                        %surcharge,
                        fare = %self.fare.current_fare(),
                        "paused-time surcharge applied"
                    );

                    if let Some(position) = self.current_position() {
                        self.emit(position);
                    }
                }
            }
            PlaybackStatus::Idle | PlaybackStatus::Completed | PlaybackStatus::Stopped => {}
        }
    }

    /// Tick on behalf of a scheduler.
    ///
    /// Does nothing and returns `false` when `run` has been cancelled or has
    /// finished; returns whether `run` is still live after the tick.
    pub fn tick_for(&mut self, run: RunId) -> bool {
        if self.active_run != Some(run) {
            return false;
        }

        self.tick();
        self.active_run == Some(run)
    }

    pub fn pause(&mut self) {
        if self.state.status != PlaybackStatus::Running {
            return;
        }

        self.state.status = PlaybackStatus::Paused;
        debug!(cursor = self.state.cursor, "playback paused");

        if let Some(position) = self.current_position() {
            self.emit(position);
        }
    }

    pub fn resume(&mut self) {
        if self.state.status != PlaybackStatus::Paused {
            return;
        }

        self.state.status = PlaybackStatus::Running;
        debug!(
            cursor = self.state.cursor,
            paused_seconds = self.fare.state().paused_seconds,
            "playback resumed"
        );

        if let Some(position) = self.current_position() {
            self.emit(position);
        }
    }

    /// Cancel the run and leave the cursor where it is
    pub fn stop(&mut self) {
        if !self.state.status.is_active() {
            return;
        }

        self.active_run = None;
        self.state.status = PlaybackStatus::Stopped;
        self.fare.clear_paused();

        info!(
            cursor = self.state.cursor,
            fare = %self.fare.current_fare(),
            "playback stopped"
        );

        if let Some(position) = self.current_position() {
            self.emit(position);
        }
    }

    pub fn reset(&mut self) {
        self.active_run = None;
        self.state = PlaybackState::default();
        self.fare.reset_fare();

        debug!("playback reset");
    }

    fn step(&mut self) {
        let Some(route) = self.route.clone() else {
            return;
        };

        let length = route.length();
        let cursor = self.state.cursor;

        if cursor >= length {
            self.complete(route.destination());
            return;
        }

        let (from, to) = match (route.at(cursor), route.at(cursor + 1)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(err), _) | (_, Err(err)) => {
                error!(%err, cursor, "playback cursor escaped the route");
                debug_assert!(false, "playback cursor escaped the route: {err}");
                return;
            }
        };

        // Zero-length segments have no bearing; keep facing the same way.
        if from != to {
            let bearing = bearing_between(from, to);
            self.state.heading = normalize_degrees(bearing);
            self.state.compass = bearing_to_compass(bearing);
        }

        self.state.cursor = cursor + 1;
        trace!(
            cursor = self.state.cursor,
            heading = self.state.heading,
            compass = %self.state.compass,
            "stepped"
        );

        if self.state.cursor == length {
            self.complete(to);
        } else {
            self.emit(to);
        }
    }

    fn complete(&mut self, position: Waypoint) {
        self.state.status = PlaybackStatus::Completed;
        self.active_run = None;

        info!(
            cursor = self.state.cursor,
            fare = %self.fare.current_fare(),
            "playback completed"
        );
        self.emit(position);
    }

    fn current_position(&self) -> Option<Waypoint> {
        self.route
            .as_ref()
            .and_then(|route| route.at(self.state.cursor).ok())
    }

    fn update_at(&self, position: Waypoint) -> PlaybackUpdate {
        PlaybackUpdate {
            position,
            cursor: self.state.cursor,
            heading: self.state.heading,
            compass: self.state.compass,
            status: self.state.status,
            fare: self.fare.current_fare(),
        }
    }

    fn emit(&self, position: Waypoint) {
        let update = self.update_at(position);

        for observer in &self.update_observers {
            observer(&update);
        }

        for observer in &self.persist_observers {
            observer(&update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::Mutex;

    fn route(points: &[(f64, f64)]) -> Arc<Route> {
        Arc::new(
            Route::from_waypoints(points.iter().map(|&(lat, lng)| Waypoint::new(lat, lng)))
                .unwrap(),
        )
    }

    fn equator_route() -> Arc<Route> {
        route(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)])
    }

    fn controller_with(route: Arc<Route>) -> PlaybackController {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), Money(1_000));
        controller.set_route(route);
        controller
    }

    fn record(controller: &mut PlaybackController) -> Arc<Mutex<Vec<PlaybackUpdate>>> {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        controller.on_update(move |update| sink.lock().unwrap().push(*update));
        updates
    }

    fn paused_controller() -> PlaybackController {
        let mut controller = controller_with(equator_route());
        controller.start().unwrap();
        controller.pause();
        controller
    }

    #[test]
    fn test_start_without_route() {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), Money(1_000));
        assert!(matches!(controller.start(), Err(PlaybackError::EmptyRoute)));
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn test_three_waypoint_scenario() {
        let mut controller = controller_with(equator_route());
        controller.start().unwrap();

        let state = controller.state();
        assert_eq!(state.status, PlaybackStatus::Running);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.heading, 0.0);

        controller.tick();
        let state = controller.state();
        assert_eq!(state.cursor, 1);
        assert_eq!(state.compass, Compass::E);
        assert_abs_diff_eq!(state.heading, 90.0, epsilon = 1e-9);
        assert_eq!(state.status, PlaybackStatus::Running);

        controller.tick();
        let state = controller.state();
        assert_eq!(state.cursor, 2);
        assert_eq!(state.status, PlaybackStatus::Completed);
        assert_eq!(controller.active_run(), None);
    }

    #[test]
    fn test_single_waypoint_completes_on_first_tick() {
        let mut controller = controller_with(route(&[(10.0, 10.0)]));
        controller.start().unwrap();

        controller.tick();

        let state = controller.state();
        assert_eq!(state.status, PlaybackStatus::Completed);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.heading, 0.0);
        assert_eq!(state.compass, Compass::N);
    }

    #[test]
    fn test_single_segment_completes_after_one_tick() {
        let mut controller = controller_with(route(&[(0.0, 0.0), (1.0, 0.0)]));
        controller.start().unwrap();

        controller.tick();
        assert_eq!(controller.status(), PlaybackStatus::Completed);
        assert_eq!(controller.state().cursor, 1);
        assert_eq!(controller.state().compass, Compass::N);
    }

    #[test]
    fn test_ticks_after_completion_are_noops() {
        let mut controller = controller_with(route(&[(0.0, 0.0), (1.0, 0.0)]));
        let updates = record(&mut controller);
        controller.start().unwrap();
        controller.tick();

        let before = updates.lock().unwrap().len();
        for _ in 0..5 {
            controller.tick();
        }

        assert_eq!(controller.state().cursor, 1);
        assert_eq!(controller.status(), PlaybackStatus::Completed);
        assert_eq!(updates.lock().unwrap().len(), before);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut controller = controller_with(equator_route());

        let first = controller.start().unwrap();
        assert!(matches!(first, StartOutcome::Started(_)));
        controller.tick();

        let second = controller.start().unwrap();
        assert_eq!(second, StartOutcome::AlreadyActive(first.run_id()));
        assert_eq!(controller.state().cursor, 1);

        controller.pause();
        let third = controller.start().unwrap();
        assert_eq!(third, StartOutcome::AlreadyActive(first.run_id()));
        assert_eq!(controller.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_restart_after_completion_gets_new_run() {
        let mut controller = controller_with(route(&[(0.0, 0.0), (1.0, 0.0)]));
        let first = controller.start().unwrap().run_id();
        controller.tick();

        let second = controller.start().unwrap();
        assert!(matches!(second, StartOutcome::Started(run) if run != first));
        assert_eq!(controller.state().cursor, 0);
        assert_eq!(controller.status(), PlaybackStatus::Running);
    }

    #[test]
    fn test_paused_ticks_do_not_advance() {
        let mut controller = controller_with(equator_route());
        controller.start().unwrap();
        controller.tick();
        controller.pause();

        for _ in 0..10 {
            controller.tick();
        }

        assert_eq!(controller.state().cursor, 1);
        assert_eq!(controller.fare().paused_seconds, 10);

        controller.resume();
        controller.tick();
        assert_eq!(controller.status(), PlaybackStatus::Completed);
    }

    #[test]
    fn test_surcharge_after_31_paused_ticks() {
        let mut controller = paused_controller();

        for _ in 0..31 {
            controller.tick();
        }

        let fare = controller.fare();
        assert_eq!(fare.accrued_surcharge, Money::from_major(0.31));
        assert_eq!(fare.paused_seconds, 0);
        assert_eq!(controller.current_fare(), Money(1_031));
    }

    #[test]
    fn test_surcharge_threshold_scenario() {
        let mut controller = paused_controller();

        for _ in 0..29 {
            controller.tick();
        }
        assert_eq!(controller.fare().accrued_surcharge, Money::ZERO);

        controller.tick();
        controller.tick();
        assert_eq!(controller.fare().accrued_surcharge, Money::from_cents(31));
    }

    #[test]
    fn test_surcharge_notifies_observers() {
        let mut controller = paused_controller();
        let updates = record(&mut controller);

        for _ in 0..31 {
            controller.tick();
        }

        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status, PlaybackStatus::Paused);
        assert_eq!(updates[0].fare, Money(1_031));
    }

    #[test]
    fn test_stop_freezes_cursor() {
        let mut controller = controller_with(equator_route());
        controller.start().unwrap();
        controller.tick();
        controller.stop();

        for _ in 0..5 {
            controller.tick();
        }

        let state = controller.state();
        assert_eq!(state.status, PlaybackStatus::Stopped);
        assert_eq!(state.cursor, 1);
        assert_eq!(controller.active_run(), None);
    }

    #[test]
    fn test_stop_clears_paused_seconds_keeps_surcharge() {
        let mut controller = paused_controller();
        for _ in 0..35 {
            controller.tick();
        }
        assert_eq!(controller.fare().paused_seconds, 4);

        controller.stop();

        let fare = controller.fare();
        assert_eq!(fare.paused_seconds, 0);
        assert_eq!(fare.accrued_surcharge, Money(31));
    }

    #[test]
    fn test_stop_only_from_active_states() {
        let mut controller = controller_with(equator_route());
        let updates = record(&mut controller);

        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Idle);

        controller.start().unwrap();
        controller.tick();
        controller.tick();
        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Completed);

        assert!(updates
            .lock()
            .unwrap()
            .iter()
            .all(|update| update.status != PlaybackStatus::Stopped));
    }

    #[test]
    fn test_reset_from_any_state() {
        let setups: Vec<Box<dyn Fn(&mut PlaybackController)>> = vec![
            Box::new(|_: &mut PlaybackController| {}),
            Box::new(|c: &mut PlaybackController| {
                c.start().unwrap();
                c.tick();
            }),
            Box::new(|c: &mut PlaybackController| {
                c.start().unwrap();
                c.pause();
                for _ in 0..40 {
                    c.tick();
                }
            }),
            Box::new(|c: &mut PlaybackController| {
                c.start().unwrap();
                c.tick();
                c.tick();
            }),
            Box::new(|c: &mut PlaybackController| {
                c.start().unwrap();
                c.tick();
                c.stop();
            }),
        ];

        for setup in setups {
            let mut controller = controller_with(equator_route());
            setup(&mut controller);
            controller.reset();

            let state = controller.state();
            let fare = controller.fare();
            assert_eq!(state.status, PlaybackStatus::Idle);
            assert_eq!(state.cursor, 0);
            assert_eq!(state.heading, 0.0);
            assert_eq!(fare.accrued_surcharge, Money::ZERO);
            assert_eq!(fare.paused_seconds, 0);
            assert_eq!(controller.current_fare(), Money(1_000));
            assert_eq!(controller.active_run(), None);
        }
    }

    #[test]
    fn test_pause_resume_noops_in_wrong_state() {
        let mut controller = controller_with(equator_route());

        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        controller.resume();
        assert_eq!(controller.status(), PlaybackStatus::Idle);

        controller.start().unwrap();
        controller.resume();
        assert_eq!(controller.status(), PlaybackStatus::Running);

        controller.pause();
        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_zero_length_segment_keeps_heading() {
        let mut controller =
            controller_with(route(&[(0.0, 0.0), (0.0, 1.0), (0.0, 1.0), (1.0, 1.0)]));
        controller.start().unwrap();

        controller.tick();
        assert_eq!(controller.state().compass, Compass::E);

        controller.tick();
        assert_eq!(controller.state().cursor, 2);
        assert_eq!(controller.state().compass, Compass::E);
        assert_abs_diff_eq!(controller.state().heading, 90.0, epsilon = 1e-9);

        controller.tick();
        assert_eq!(controller.state().compass, Compass::N);
        assert_eq!(controller.status(), PlaybackStatus::Completed);
    }

    #[test]
    fn test_replacing_route_cancels_run() {
        let mut controller = controller_with(equator_route());
        let updates = record(&mut controller);

        let run = controller.start().unwrap().run_id();
        controller.tick();

        let replacement = route(&[(1.0, 1.0), (2.0, 2.0)]);
        controller.set_route(Arc::clone(&replacement));

        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.state().cursor, 0);
        assert!(Arc::ptr_eq(controller.route().unwrap(), &replacement));
        assert!(!controller.tick_for(run));

        let last = *updates.lock().unwrap().last().unwrap();
        assert_eq!(last.status, PlaybackStatus::Stopped);
        assert_eq!(last.cursor, 1);

        let next = controller.start().unwrap();
        assert!(matches!(next, StartOutcome::Started(r) if r != run));
    }

    #[test]
    fn test_reloading_same_route_is_noop() {
        let shared = equator_route();
        let mut controller = controller_with(Arc::clone(&shared));
        controller.start().unwrap();
        controller.tick();

        controller.set_route(Arc::clone(&shared));

        assert_eq!(controller.status(), PlaybackStatus::Running);
        assert_eq!(controller.state().cursor, 1);
    }

    #[test]
    fn test_tick_for_stale_run() {
        let mut controller = controller_with(equator_route());
        let run = controller.start().unwrap().run_id();

        assert!(controller.tick_for(run));
        assert_eq!(controller.state().cursor, 1);

        controller.stop();
        assert!(!controller.tick_for(run));
        assert_eq!(controller.state().cursor, 1);
    }

    #[test]
    fn test_tick_for_reports_completion() {
        let mut controller = controller_with(route(&[(0.0, 0.0), (0.0, 1.0)]));
        let run = controller.start().unwrap().run_id();

        assert!(!controller.tick_for(run));
        assert_eq!(controller.status(), PlaybackStatus::Completed);
    }

    #[test]
    fn test_update_and_persist_observers() {
        let mut controller = controller_with(equator_route());
        let updates = record(&mut controller);

        let persisted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&persisted);
        controller.on_persist(move |update| sink.lock().unwrap().push(update.status));

        controller.start().unwrap();
        controller.tick();
        controller.tick();

        let updates = updates.lock().unwrap();
        let positions: Vec<_> = updates.iter().map(|u| u.position).collect();
        assert_eq!(positions, vec![
            Waypoint::new(0.0, 0.0),
            Waypoint::new(0.0, 1.0),
            Waypoint::new(0.0, 2.0),
        ]);
        assert_eq!(updates[1].compass, Compass::E);

        assert_eq!(*persisted.lock().unwrap(), vec![
            PlaybackStatus::Running,
            PlaybackStatus::Running,
            PlaybackStatus::Completed,
        ]);
    }

    #[test]
    fn test_base_fare_fixed_while_active() {
        let mut controller = controller_with(equator_route());
        controller.start().unwrap();

        assert!(!controller.set_base_fare(Money(5_000)));
        assert_eq!(controller.fare().base_fare, Money(1_000));

        controller.stop();
        assert!(controller.set_base_fare(Money(5_000)));
        assert_eq!(controller.current_fare(), Money(5_000));
    }

    #[test]
    fn test_snapshot() {
        let mut controller = PlaybackController::new(&PlaybackConfig::default(), Money(1_000));
        assert!(controller.snapshot().is_none());

        controller.set_route(equator_route());
        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.position, Waypoint::new(0.0, 0.0));
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
    }
}

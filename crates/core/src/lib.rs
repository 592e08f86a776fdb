//! Route playback and cost accrual.
//!
//! A [`controller::PlaybackController`] walks a vehicle along a fetched
//! route one waypoint per simulated second, derives a compass heading for
//! icon selection and charges a surcharge while paused. [`player::Player`]
//! drives it from a Tokio timer, and [`sink::PositionSink`] forwards every
//! update to trip persistence without ever blocking a tick.

pub mod config;
pub mod controller;
pub mod fare;
pub mod heading;
pub mod planner;
pub mod player;
pub mod sink;
pub mod types;

// Re-export route from the route crate
pub use ride_sim_route as route;

pub use config::{FareSchedule, PlaybackConfig};
pub use controller::{
    PlaybackController, PlaybackError, PlaybackState, PlaybackStatus, PlaybackUpdate, RunId,
    StartOutcome,
};
pub use fare::{CostAccrualPolicy, FareState};
pub use heading::{Compass, bearing_to_compass};
pub use planner::{PlannedTrip, TripPlanner};
pub use player::Player;
pub use sink::{PersistError, PositionSink, SinkStats, TripPersistence, TripUpdate};
pub use types::Money;

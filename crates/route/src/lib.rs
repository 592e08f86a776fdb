//! # ride-sim-route
//!
//! Route data, geometry and provider seams for trip playback.
//!
//! ## Features
//!
//! - **Value-object routes**: ordered, non-empty waypoint sequences shared by `Arc`
//! - **Great-circle geometry**: haversine distance, bearing and interpolation
//! - **Pluggable providers**: implement your own geocoding and routing backends
//! - **Static provider**: in-memory geocoder and straight-line router for tests and replays
//!
//! ## Example
//!
//! ```
//! use ride_sim_route::prelude::*;
//!
//! let route = Route::from_waypoints(vec![
//!     Waypoint::new(0.0, 0.0),
//!     Waypoint::new(0.0, 1.0),
//!     Waypoint::new(0.0, 2.0),
//! ])
//! .unwrap();
//!
//! assert_eq!(route.length(), 2);
//!
//! // Heading due east along the equator
//! let bearing = bearing_between(route.at(0).unwrap(), route.at(1).unwrap());
//! assert!((bearing - 90.0).abs() < 1e-9);
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{route::Route, types::*};
    pub use crate::network::traits::*;
    pub use crate::provider::static_provider::StaticRouteProvider;
    pub use crate::spatial::queries::{bearing_between, haversine_distance, interpolate};
}

pub use prelude::*;

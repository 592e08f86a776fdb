//! Great-circle geometry between waypoints.
//!
//! Uses the Haversine formula on a spherical Earth.

use geo::{Bearing, Distance, Haversine, InterpolatePoint};

use crate::models::types::Waypoint;

/// Haversine distance between two waypoints in meters
pub fn haversine_distance(a: Waypoint, b: Waypoint) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// Initial great-circle bearing from `a` toward `b`, in degrees clockwise from north.
///
/// Undefined when `a == b`; callers skip zero-length segments.
pub fn bearing_between(a: Waypoint, b: Waypoint) -> f64 {
    Haversine.bearing(a.to_point(), b.to_point()).rem_euclid(360.0)
}

/// Point at `ratio` (0.0..=1.0) of the way along the great circle from `a` to `b`
pub fn interpolate(a: Waypoint, b: Waypoint, ratio: f64) -> Waypoint {
    Haversine
        .point_at_ratio_between(a.to_point(), b.to_point(), ratio)
        .into()
}

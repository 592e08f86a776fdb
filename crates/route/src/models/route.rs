//! Immutable route value object.
//!
//! A [`Route`] is never edited in place. Fetching a new route produces a new
//! value, and holders compare `Arc<Route>` identity to spot a stale one.

use crate::models::types::*;
use crate::spatial::queries::haversine_distance;

/// Ordered, non-empty sequence of waypoints. Insertion order is traversal order.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    distance_m: Option<f64>,
    duration_s: Option<f64>,
}

impl Route {
    /// Build a route from waypoints.
    ///
    /// Returns `Err(InvalidRoute)` if there are no waypoints or any of them
    /// has a non-finite coordinate.
    pub fn from_waypoints(waypoints: impl IntoIterator<Item = Waypoint>) -> Result<Self> {
        let waypoints: Vec<Waypoint> = waypoints.into_iter().collect();

        if waypoints.is_empty() {
            return Err(RouteError::InvalidRoute("route has no waypoints".into()));
        }

        if let Some(index) = waypoints.iter().position(|w| !w.is_finite()) {
            return Err(RouteError::InvalidRoute(format!(
                "waypoint {index} has a non-finite coordinate"
            )));
        }

        Ok(Self {
            waypoints,
            distance_m: None,
            duration_s: None,
        })
    }

    /// Build a route from a provider response, keeping its reported metrics.
    pub fn from_response(response: RouteResponse) -> Result<Self> {
        let RouteResponse {
            waypoints,
            distance_m,
            duration_s,
        } = response;

        Ok(Self {
            distance_m: Some(distance_m),
            duration_s: Some(duration_s),
            ..Self::from_waypoints(waypoints)?
        })
    }

    /// Number of segments (waypoint count - 1).
    pub fn length(&self) -> usize {
        self.waypoints.len() - 1
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Waypoint at `index`, valid for `0..=length()`.
    pub fn at(&self, index: usize) -> Result<Waypoint> {
        self.waypoints
            .get(index)
            .copied()
            .ok_or(RouteError::IndexOutOfRange {
                index,
                length: self.length(),
            })
    }

    pub fn origin(&self) -> Waypoint {
        self.waypoints[0]
    }

    pub fn destination(&self) -> Waypoint {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Consecutive (from, to) pairs in traversal order.
    pub fn segments(&self) -> impl Iterator<Item = (Waypoint, Waypoint)> + '_ {
        self.waypoints.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Provider-reported distance in meters, if known.
    pub fn reported_distance_m(&self) -> Option<f64> {
        self.distance_m
    }

    /// Provider-reported duration in seconds, if known.
    pub fn reported_duration_s(&self) -> Option<f64> {
        self.duration_s
    }

    /// Sum of great-circle segment lengths in meters
    pub fn path_length_m(&self) -> f64 {
        self.segments()
            .map(|(from, to)| haversine_distance(from, to))
            .sum()
    }
}

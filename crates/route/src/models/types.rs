//! Core data types for routes.

use geo::Point;

// ============================================================================
// Data Structures
// ============================================================================

/// A single geographic point on a route, in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// geo uses x = longitude, y = latitude
    pub fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<Point> for Waypoint {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Waypoint> for Point {
    fn from(waypoint: Waypoint) -> Self {
        waypoint.to_point()
    }
}

/// What a route provider hands back for an origin/destination pair.
///
/// Distance is in meters, duration in seconds. Both are reported by the
/// provider and never recomputed during playback.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteResponse {
    pub waypoints: Vec<Waypoint>,
    pub distance_m: f64,
    pub duration_s: f64,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Waypoint index {index} out of range for route of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    #[error("Geocoding provider is not ready")]
    GeocodeUnavailable,

    #[error("No result for {0}")]
    NoResult(String),

    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_point_axes() {
        let waypoint = Waypoint::new(40.7128, -74.0060);
        let point = waypoint.to_point();

        assert_eq!(point.x(), -74.0060);
        assert_eq!(point.y(), 40.7128);
        assert_eq!(Waypoint::from(point), waypoint);
    }

    #[test]
    fn test_waypoint_is_finite() {
        assert!(Waypoint::new(0.0, 0.0).is_finite());
        assert!(!Waypoint::new(f64::NAN, 0.0).is_finite());
        assert!(!Waypoint::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_error_messages() {
        let err = RouteError::IndexOutOfRange { index: 5, length: 2 };
        assert_eq!(
            err.to_string(),
            "Waypoint index 5 out of range for route of length 2"
        );
        assert_eq!(
            RouteError::NoResult("Main St".into()).to_string(),
            "No result for Main St"
        );
    }
}

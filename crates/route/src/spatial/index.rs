//! R-tree nodes for reverse geocoding.
//!
//! ## Two-Stage Filtering
//!
//! Nearest-address lookups use a two-stage approach:
//! 1. **R-tree filter**: Euclidean distance in degree space picks the candidate
//! 2. **Haversine filter**: the geodesic distance decides whether it is close enough
//!
//! Euclidean distance in degrees is only a ranking heuristic; the final
//! radius check is always done in meters.

use std::sync::Arc;

use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::Waypoint;

#[derive(Clone, Debug)]
pub struct AddressNode {
    pub address: Arc<str>,
    pub location: Waypoint,
    point: [f64; 2],
}

impl AddressNode {
    pub fn new(address: Arc<str>, location: Waypoint) -> Self {
        Self {
            address,
            location,
            point: [location.lng, location.lat],
        }
    }
}

impl RTreeObject for AddressNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for AddressNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

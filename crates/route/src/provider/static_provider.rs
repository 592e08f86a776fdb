//! In-memory geocoding and routing provider.
//!
//! Resolves addresses from a fixed table and answers route requests with a
//! straight great-circle path cut into evenly spaced waypoints. Useful for
//! tests and offline replays where no real backend is reachable.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rstar::RTree;

use crate::models::types::*;
use crate::network::traits::{GeocodingProvider, RouteProvider};
use crate::spatial::index::AddressNode;
use crate::spatial::queries::{haversine_distance, interpolate};

/// Default radius for reverse geocoding hits, in meters.
pub const DEFAULT_REVERSE_RADIUS_M: f64 = 250.0;

/// Default distance between generated waypoints, in meters.
pub const DEFAULT_WAYPOINT_SPACING_M: f64 = 100.0;

/// Default travel speed used to estimate durations (~30 km/h).
pub const DEFAULT_AVERAGE_SPEED_MPS: f64 = 8.33;

const MAX_SEGMENTS: usize = 10_000;

/// In-memory provider with spatial indexing
///
/// This type is cheap to clone; the readiness flag is shared between clones.
#[derive(Clone)]
pub struct StaticRouteProvider {
    addresses: HashMap<String, Waypoint>,
    address_tree: RTree<AddressNode>,

    reverse_radius_m: f64,
    waypoint_spacing_m: f64,
    average_speed_mps: f64,

    ready: Arc<AtomicBool>,
}

impl StaticRouteProvider {
    /// Create a new provider with no known addresses
    pub fn new() -> Self {
        Self::from_addresses(Vec::<(&str, Waypoint)>::new())
    }

    /// Build provider from an address table
    pub fn from_addresses<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Waypoint)>,
        S: AsRef<str>,
    {
        let mut addresses = HashMap::new();
        let mut nodes = Vec::new();

        for (name, location) in entries {
            let name = name.as_ref();
            addresses.insert(normalize_address(name), location);
            nodes.push(AddressNode::new(name.into(), location));
        }

        Self {
            addresses,
            address_tree: RTree::bulk_load(nodes),
            reverse_radius_m: DEFAULT_REVERSE_RADIUS_M,
            waypoint_spacing_m: DEFAULT_WAYPOINT_SPACING_M,
            average_speed_mps: DEFAULT_AVERAGE_SPEED_MPS,
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_reverse_radius(mut self, radius_m: f64) -> Self {
        self.reverse_radius_m = radius_m;
        self
    }

    pub fn with_waypoint_spacing(mut self, spacing_m: f64) -> Self {
        self.waypoint_spacing_m = spacing_m;
        self
    }

    pub fn with_average_speed(mut self, speed_mps: f64) -> Self {
        self.average_speed_mps = speed_mps;
        self
    }

    /// Simulate a provider that has not finished loading
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn lookup(&self, address: &str) -> Result<Waypoint> {
        if !self.is_ready() {
            return Err(RouteError::GeocodeUnavailable);
        }

        self.addresses
            .get(&normalize_address(address))
            .copied()
            .ok_or_else(|| RouteError::NoResult(address.to_string()))
    }

    pub fn nearest_address(&self, location: Waypoint) -> Result<String> {
        if !self.is_ready() {
            return Err(RouteError::GeocodeUnavailable);
        }

        let no_result = || RouteError::NoResult(format!("{:.5},{:.5}", location.lat, location.lng));

        if !location.is_finite() {
            return Err(no_result());
        }

        let node = self
            .address_tree
            .nearest_neighbor(&[location.lng, location.lat])
            .ok_or_else(no_result)?;

        if haversine_distance(location, node.location) > self.reverse_radius_m {
            return Err(no_result());
        }

        Ok(node.address.to_string())
    }

    /// Straight great-circle path from `origin` to `destination`.
    ///
    /// Identical endpoints yield a single-waypoint path with zero distance.
    pub fn straight_route(&self, origin: Waypoint, destination: Waypoint) -> Result<RouteResponse> {
        if !self.is_ready() {
            return Err(RouteError::RouteUnavailable("provider not ready".into()));
        }

        if !origin.is_finite() || !destination.is_finite() {
            return Err(RouteError::RouteUnavailable("non-finite endpoint".into()));
        }

        if self.waypoint_spacing_m <= 0.0 || !self.waypoint_spacing_m.is_finite() {
            return Err(RouteError::RouteUnavailable(format!(
                "invalid waypoint spacing {}",
                self.waypoint_spacing_m
            )));
        }

        let distance_m = haversine_distance(origin, destination);

        let segments = if distance_m == 0.0 {
            0
        } else {
            ((distance_m / self.waypoint_spacing_m).ceil() as usize).clamp(1, MAX_SEGMENTS)
        };

        let waypoints = (0..=segments)
            .map(|i| match i {
                0 => origin,
                i if i == segments => destination,
                i => interpolate(origin, destination, i as f64 / segments as f64),
            })
            .collect();

        let duration_s = if self.average_speed_mps > 0.0 {
            distance_m / self.average_speed_mps
        } else {
            0.0
        };

        tracing::debug!(segments, distance_m, duration_s, "planned straight route");

        Ok(RouteResponse {
            waypoints,
            distance_m,
            duration_s,
        })
    }
}

impl Default for StaticRouteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingProvider for StaticRouteProvider {
    fn reverse_geocode<'a>(
        &'a self,
        location: Waypoint,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(ready(self.nearest_address(location)))
    }

    fn forward_geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Waypoint>> + Send + 'a>> {
        Box::pin(ready(self.lookup(address)))
    }
}

impl RouteProvider for StaticRouteProvider {
    fn fetch_route<'a>(
        &'a self,
        origin: Waypoint,
        destination: Waypoint,
    ) -> Pin<Box<dyn Future<Output = Result<RouteResponse>> + Send + 'a>> {
        Box::pin(ready(self.straight_route(origin, destination)))
    }
}

fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

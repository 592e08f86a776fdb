//! Pluggable provider traits.
//!
//! External crates implement these to back geocoding and routing with a real
//! service. All calls happen before playback starts, never inside a tick.

use std::future::Future;
use std::pin::Pin;

use crate::models::types::{Result, RouteResponse, Waypoint};

/// Resolve addresses to coordinates and back
pub trait GeocodingProvider: Send + Sync {
    /// Fails with `GeocodeUnavailable` if the provider is not ready, or
    /// `NoResult` if nothing resolves.
    fn reverse_geocode<'a>(
        &'a self,
        location: Waypoint,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    fn forward_geocode<'a>(
        &'a self,
        address: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Waypoint>> + Send + 'a>>;
}

/// Fetch an ordered path between two points
pub trait RouteProvider: Send + Sync {
    /// Fails with `RouteUnavailable` on any non-success provider status.
    fn fetch_route<'a>(
        &'a self,
        origin: Waypoint,
        destination: Waypoint,
    ) -> Pin<Box<dyn Future<Output = Result<RouteResponse>> + Send + 'a>>;
}

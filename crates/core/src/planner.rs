//! Pre-flight trip planning.
//!
//! Everything that can fail upstream (geocoding, routing) happens here,
//! before a run starts. The base fare is quoted once from the provider's
//! reported distance and duration and never recomputed during playback.

use std::sync::Arc;

use ride_sim_route::{GeocodingProvider, Result, Route, RouteProvider, Waypoint};
use tracing::{debug, info};

use crate::config::FareSchedule;
use crate::player::Player;
use crate::types::Money;

#[derive(Clone, Debug)]
pub struct PlannedTrip {
    pub origin: Waypoint,
    pub destination: Waypoint,
    pub route: Arc<Route>,
    pub base_fare: Money,
}

impl PlannedTrip {
    /// Replace the player's route with this trip and fix its base fare
    pub fn load_into(&self, player: &Player) {
        player.set_route(Arc::clone(&self.route));
        player.set_base_fare(self.base_fare);
    }
}

pub struct TripPlanner {
    geocoder: Arc<dyn GeocodingProvider>,
    router: Arc<dyn RouteProvider>,
    schedule: FareSchedule,
}

impl TripPlanner {
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        router: Arc<dyn RouteProvider>,
        schedule: FareSchedule,
    ) -> Self {
        Self {
            geocoder,
            router,
            schedule,
        }
    }

    /// Geocode both addresses and fetch the route between them
    pub async fn plan(&self, origin: &str, destination: &str) -> Result<PlannedTrip> {
        let origin_point = self.geocoder.forward_geocode(origin).await?;
        let destination_point = self.geocoder.forward_geocode(destination).await?;

        debug!(origin, destination, "addresses resolved");
        self.plan_between(origin_point, destination_point).await
    }

    pub async fn plan_between(&self, origin: Waypoint, destination: Waypoint) -> Result<PlannedTrip> {
        let response = self.router.fetch_route(origin, destination).await?;
        let base_fare = self.schedule.quote(response.distance_m, response.duration_s);
        let route = Route::from_response(response)?;

        info!(
            waypoints = route.waypoint_count(),
            distance_m = route.reported_distance_m(),
            duration_s = route.reported_duration_s(),
            %base_fare,
            "trip planned"
        );

        Ok(PlannedTrip {
            origin,
            destination,
            route: Arc::new(route),
            base_fare,
        })
    }

    /// Best-effort address for display; lookup failures yield `None`
    pub async fn describe_position(&self, position: Waypoint) -> Option<String> {
        match self.geocoder.reverse_geocode(position).await {
            Ok(address) => Some(address),
            Err(err) => {
                debug!(%err, lat = position.lat, lng = position.lng, "no address for position");
                None
            }
        }
    }
}

use anyhow::{bail, Context, Result};
use geojson::GeoJson;
use ride_sim_core::route::{Route, Waypoint};
use std::path::Path;

/// Read a route from a GeoJSON file
///
/// Accepts a LineString (or the first line of a MultiLineString), either bare,
/// in a Feature, or as the first line found in a FeatureCollection. A
/// FeatureCollection without lines is read as an ordered list of Points.
pub fn read_route(path: &Path) -> Result<Route> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route file: {}", path.display()))?;

    parse_route(&content).with_context(|| format!("No usable route in: {}", path.display()))
}

pub fn parse_route(content: &str) -> Result<Route> {
    let geojson: GeoJson = content.parse().context("Failed to parse GeoJSON")?;
    let waypoints = extract_waypoints(geojson)?;

    Route::from_waypoints(waypoints).context("Invalid route geometry")
}

fn extract_waypoints(geojson: GeoJson) -> Result<Vec<Waypoint>> {
    match geojson {
        GeoJson::Geometry(geom) => geometry_to_line(geom.value),
        GeoJson::Feature(feature) => match feature.geometry {
            Some(geom) => geometry_to_line(geom.value),
            None => bail!("Feature has no geometry"),
        },
        GeoJson::FeatureCollection(fc) => {
            let values: Vec<geojson::Value> = fc
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry.map(|geom| geom.value))
                .collect();

            if let Some(line) = values
                .iter()
                .find(|value| matches!(value, geojson::Value::LineString(_) | geojson::Value::MultiLineString(_)))
            {
                return geometry_to_line(line.clone());
            }

            // Fall back to points in feature order
            let points = values
                .iter()
                .filter_map(|value| match value {
                    geojson::Value::Point(position) => Some(position_to_waypoint(position)),
                    _ => None,
                })
                .collect::<Result<Vec<_>>>()?;

            if points.is_empty() {
                bail!("No LineString or Point features found in FeatureCollection");
            }
            Ok(points)
        }
    }
}

fn geometry_to_line(value: geojson::Value) -> Result<Vec<Waypoint>> {
    match value {
        geojson::Value::LineString(positions) => positions_to_waypoints(&positions),
        geojson::Value::MultiLineString(lines) => match lines.first() {
            Some(positions) => positions_to_waypoints(positions),
            None => bail!("MultiLineString is empty"),
        },
        geojson::Value::Point(position) => Ok(vec![position_to_waypoint(&position)?]),
        other => bail!("Unsupported geometry type for a route: {}", geometry_kind(&other)),
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn positions_to_waypoints(positions: &[geojson::Position]) -> Result<Vec<Waypoint>> {
    positions.iter().map(position_to_waypoint).collect()
}

/// GeoJSON positions are [longitude, latitude, (altitude)]
fn position_to_waypoint(position: &geojson::Position) -> Result<Waypoint> {
    match position.as_slice() {
        [lng, lat, ..] => Ok(Waypoint::new(*lat, *lng)),
        _ => bail!("Position needs at least two coordinates, got {}", position.len()),
    }
}

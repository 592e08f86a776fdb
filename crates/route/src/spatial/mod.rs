//! Spatial indexing and great-circle geometry.

pub mod index;
pub mod queries;

pub use queries::{bearing_between, haversine_distance, interpolate};

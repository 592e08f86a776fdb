//! Provider abstractions for geocoding and routing backends.

pub mod traits;

pub use traits::{GeocodingProvider, RouteProvider};

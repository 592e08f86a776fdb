//! Route data models and error types.

pub mod route;
pub mod types;

// Re-exports for convenience
pub use route::Route;
pub use types::{Result, RouteError, RouteResponse, Waypoint};

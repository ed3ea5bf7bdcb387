pub mod client;
pub mod leg;
pub mod provider;

pub use client::{RouteError, Router};
pub use leg::{Measure, RouteLeg, RouteStep, TransitDetails, TravelMode};
pub use provider::{Coordinates, HttpRouteProvider, ProviderError, RouteProvider};

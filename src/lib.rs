//! geo-gate Library
//!
//! Geolocation-based request gating: client address extraction, location
//! lookup and allow-list evaluation, exposed as axum middleware.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::inbound::{build_router, protect, GateServer};
pub use application::GeoGateService;
pub use config::{load_config, load_policy};
pub use domain::entities::{Decision, GeoContext, LocationRecord};
pub use domain::policy::{Policy, PolicyConfig};
pub use domain::ports::{LocationResolver, LookupError};
pub use domain::services::IpExtractor;
pub use domain::value_objects::{ClientIp, Coordinate, Geofence, IpSource};

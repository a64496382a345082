//! Domain Layer
//!
//! Pure types, ports and decision logic. Nothing in here performs I/O.

pub mod entities;
pub mod policy;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Decision, GeoContext, LocationRecord};
pub use policy::{Policy, PolicyConfig, PolicyError};
pub use value_objects::{ClientIp, Coordinate, Geofence, IpSource};

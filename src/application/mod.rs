//! Application Layer
//!
//! Use cases orchestrating the domain and its ports.

mod geo_gate_service;

pub use geo_gate_service::{GeoGateService, MSG_INVALID_IP, MSG_LOOKUP_FAILED, MSG_NO_IP};

//! Inbound Adapters
//!
//! HTTP middleware and the sample server that hosts it.

pub mod gate_layer;
pub mod http_server;

pub use gate_layer::{gate_response, geo_gate, protect, AxumRequestMeta, GateResponseBody};
pub use http_server::{build_router, GateServer};

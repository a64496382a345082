//! Outbound Adapters
//!
//! Implementations of the location lookup port.

mod http_location_resolver;
mod maxmind_location_resolver;

pub use http_location_resolver::HttpLocationResolver;
pub use maxmind_location_resolver::MaxMindLocationResolver;

mod location_resolver;

pub use location_resolver::{LocationResolver, LookupError};

//! Domain Entities - Core business objects
//!
//! Everything here lives for a single request at most. Nothing is cached
//! or persisted between requests.

use crate::domain::value_objects::{ClientIp, Coordinate};
use serde::{Deserialize, Serialize};

/// Location attributes resolved for a client address.
///
/// Produced by a `LocationResolver`, consumed by the allow-list evaluator.
/// A record is always complete: resolvers fail instead of returning
/// partially populated records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    pub fn new(
        country: impl Into<String>,
        city: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// What the gate learned about an allowed client.
///
/// Handed to downstream handlers through request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoContext {
    pub ip: ClientIp,
    pub location: LocationRecord,
}

/// Terminal outcome of one pass through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Continue to the next pipeline stage
    Allow(GeoContext),
    /// Resolved, but rejected by the allow-list
    Deny { status: u16, message: String },
    /// The request could not be evaluated
    Error { status: u16, message: String },
}

impl Decision {
    /// Status code the client will see. Allowed requests report 200.
    pub fn status(&self) -> u16 {
        match self {
            Self::Allow(_) => 200,
            Self::Deny { status, .. } | Self::Error { status, .. } => *status,
        }
    }
}

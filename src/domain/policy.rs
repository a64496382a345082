//! Allow-list policy
//!
//! Built once at startup and shared read-only by every request.

use crate::domain::value_objects::{Coordinate, Geofence};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_DENIED_MESSAGE: &str = "Access Denied";
pub const DEFAULT_DENIED_STATUS: u16 = 403;

/// Errors raised while building a [`Policy`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("access denied status {0} is not a valid HTTP status code")]
    InvalidStatus(u16),
    #[error("coordinate ({lat}, {lon}) is out of range")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("geofence radius {0} km must be a finite, non-negative number")]
    InvalidRadius(f64),
}

/// Serializable form of the policy, as found in config files.
///
/// Missing keys take the defaults of the gate: only `India` allowed,
/// `403 Access Denied` on rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    pub countries: Vec<String>,
    pub cities: Vec<String>,
    pub coordinates: Vec<Coordinate>,
    pub geofences: Vec<Geofence>,
    pub access_denied_message: String,
    #[serde(alias = "accessDeniedStatus")]
    pub access_denied_status_code: u16,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            countries: vec!["India".to_string()],
            cities: Vec::new(),
            coordinates: Vec::new(),
            geofences: Vec::new(),
            access_denied_message: DEFAULT_DENIED_MESSAGE.to_string(),
            access_denied_status_code: DEFAULT_DENIED_STATUS,
        }
    }
}

/// Validated, immutable allow-list policy.
///
/// Each category (countries, cities, coordinates, geofences) may be empty.
/// See [`AllowListEvaluator`](crate::domain::services::AllowListEvaluator)
/// for how categories combine.
#[derive(Debug, Clone)]
pub struct Policy {
    countries: HashSet<String>,
    cities: HashSet<String>,
    coordinates: Vec<Coordinate>,
    geofences: Vec<Geofence>,
    denied_message: String,
    denied_status: u16,
}

impl Policy {
    pub fn new(config: PolicyConfig) -> Result<Self, PolicyError> {
        if !(100..=599).contains(&config.access_denied_status_code) {
            return Err(PolicyError::InvalidStatus(config.access_denied_status_code));
        }

        let points = config
            .coordinates
            .iter()
            .copied()
            .chain(config.geofences.iter().map(Geofence::center));
        for point in points {
            if !valid_coordinate(point) {
                return Err(PolicyError::InvalidCoordinate {
                    lat: point.lat,
                    lon: point.lon,
                });
            }
        }

        if let Some(fence) = config
            .geofences
            .iter()
            .find(|g| !g.radius_km.is_finite() || g.radius_km < 0.0)
        {
            return Err(PolicyError::InvalidRadius(fence.radius_km));
        }

        Ok(Self {
            countries: config.countries.into_iter().collect(),
            cities: config.cities.into_iter().collect(),
            coordinates: config.coordinates,
            geofences: config.geofences,
            denied_message: config.access_denied_message,
            denied_status: config.access_denied_status_code,
        })
    }

    pub fn countries(&self) -> &HashSet<String> {
        &self.countries
    }

    pub fn cities(&self) -> &HashSet<String> {
        &self.cities
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn geofences(&self) -> &[Geofence] {
        &self.geofences
    }

    pub fn denied_message(&self) -> &str {
        &self.denied_message
    }

    pub fn denied_status(&self) -> u16 {
        self.denied_status
    }

    /// True when no category has entries.
    pub fn is_unrestricted(&self) -> bool {
        self.countries.is_empty()
            && self.cities.is_empty()
            && self.coordinates.is_empty()
            && self.geofences.is_empty()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            countries: HashSet::from(["India".to_string()]),
            cities: HashSet::new(),
            coordinates: Vec::new(),
            geofences: Vec::new(),
            denied_message: DEFAULT_DENIED_MESSAGE.to_string(),
            denied_status: DEFAULT_DENIED_STATUS,
        }
    }
}

fn valid_coordinate(c: Coordinate) -> bool {
    c.lat.is_finite()
        && c.lon.is_finite()
        && (-90.0..=90.0).contains(&c.lat)
        && (-180.0..=180.0).contains(&c.lon)
}

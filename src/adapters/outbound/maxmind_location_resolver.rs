//! MaxMind Location Resolver
//!
//! Implements LocationResolver using a local MaxMind GeoLite2-City database,
//! for deployments that cannot reach a remote GeoIP service.

use crate::domain::entities::LocationRecord;
use crate::domain::ports::{LocationResolver, LookupError};
use crate::domain::value_objects::ClientIp;
use async_trait::async_trait;
use maxminddb::{MaxMindDBError, Reader};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Locale used for country and city names.
const NAME_LOCALE: &str = "en";

#[derive(Debug, Default, Deserialize)]
struct Named {
    names: Option<BTreeMap<String, String>>,
}

impl Named {
    fn name(self) -> Option<String> {
        self.names?.remove(NAME_LOCALE)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CityResp {
    country: Option<Named>,
    city: Option<Named>,
    location: Option<Location>,
}

impl CityResp {
    /// All four fields or nothing.
    fn into_record(self, ip: &ClientIp) -> Result<LocationRecord, LookupError> {
        let incomplete = |field: &str| LookupError::Decode(format!("{} has no {}", ip, field));

        let country = self
            .country
            .and_then(Named::name)
            .ok_or_else(|| incomplete("country"))?;
        let city = self.city.and_then(Named::name).ok_or_else(|| incomplete("city"))?;
        let location = self.location.ok_or_else(|| incomplete("location"))?;
        let latitude = location.latitude.ok_or_else(|| incomplete("latitude"))?;
        let longitude = location.longitude.ok_or_else(|| incomplete("longitude"))?;

        Ok(LocationRecord::new(country, city, latitude, longitude))
    }
}

/// MaxMind GeoLite2-City resolver.
///
/// The database is read into memory once. Lookups never touch the network.
pub struct MaxMindLocationResolver {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindLocationResolver {
    /// Load a GeoLite2-City (or GeoIP2-City) database from a file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup(&self, ip: &ClientIp) -> Result<LocationRecord, LookupError> {
        let resp: CityResp = match self.reader.lookup(ip.addr()) {
            Ok(resp) => resp,
            Err(MaxMindDBError::AddressNotFoundError(_)) => {
                return Err(LookupError::NotFound(ip.to_string()))
            }
            Err(e) => return Err(LookupError::Decode(e.to_string())),
        };

        resp.into_record(ip)
    }
}

#[async_trait]
impl LocationResolver for MaxMindLocationResolver {
    async fn resolve(&self, ip: &ClientIp) -> Result<LocationRecord, LookupError> {
        self.lookup(ip)
    }
}

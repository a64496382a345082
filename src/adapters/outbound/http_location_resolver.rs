//! HTTP Location Resolver
//!
//! Implements LocationResolver against a remote GeoIP service exposing
//! `GET /city/{ip}`.

use crate::domain::entities::LocationRecord;
use crate::domain::ports::{LocationResolver, LookupError};
use crate::domain::value_objects::ClientIp;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Fields the gate needs from the service's JSON body.
///
/// Extra fields are ignored. Missing or mistyped ones fail the lookup.
/// Coordinates may be spelled `lat`/`lon` or `latitude`/`longitude`; when
/// both are present the short keys win.
#[derive(Debug, Deserialize)]
struct CityResponse {
    country: String,
    city: String,
    lat: Option<f64>,
    latitude: Option<f64>,
    lon: Option<f64>,
    longitude: Option<f64>,
}

impl TryFrom<CityResponse> for LocationRecord {
    type Error = LookupError;

    fn try_from(resp: CityResponse) -> Result<Self, Self::Error> {
        let lat = resp
            .lat
            .or(resp.latitude)
            .ok_or_else(|| LookupError::Decode("missing field `lat`".to_string()))?;
        let lon = resp
            .lon
            .or(resp.longitude)
            .ok_or_else(|| LookupError::Decode("missing field `lon`".to_string()))?;

        Ok(LocationRecord::new(resp.country, resp.city, lat, lon))
    }
}

/// Remote GeoIP lookup over HTTP.
///
/// Holds one `reqwest::Client` (and its connection pool) for the lifetime
/// of the process. The timeout bounds the whole exchange, including reading
/// the body. There are no retries.
pub struct HttpLocationResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLocationResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client (custom TLS roots, proxies, ...).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lookup_url(&self, ip: &ClientIp) -> String {
        format!("{}/city/{}", self.base_url, ip.as_str())
    }
}

fn transport_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport(err.to_string())
    }
}

#[async_trait]
impl LocationResolver for HttpLocationResolver {
    async fn resolve(&self, ip: &ClientIp) -> Result<LocationRecord, LookupError> {
        let url = self.lookup_url(ip);
        tracing::debug!("geoip lookup: GET {}", url);

        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let parsed: CityResponse =
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode(e.to_string()))?;

        LocationRecord::try_from(parsed)
    }
}

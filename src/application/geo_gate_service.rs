//! Geo Gate Service - Main application use case
//!
//! Runs one request through extraction, lookup and allow-list evaluation,
//! and turns every outcome into exactly one terminal [`Decision`].

use crate::domain::entities::{Decision, GeoContext};
use crate::domain::policy::Policy;
use crate::domain::ports::LocationResolver;
use crate::domain::services::{AddressError, AllowListEvaluator, IpExtractor, RequestMetadata};
use std::sync::Arc;

pub const MSG_NO_IP: &str = "No IP address found";
pub const MSG_INVALID_IP: &str = "Invalid IP address";
pub const MSG_LOOKUP_FAILED: &str = "Error occurred while reading the geoip database";

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_INTERNAL_ERROR: u16 = 500;

/// Geo gate service - main application use case.
///
/// Per request:
/// 1. Extract and validate the client address
/// 2. Resolve it to a location (one lookup, no retries)
/// 3. Evaluate the location against the policy
///
/// The service holds no per-request state. The resolver handle and policy
/// are shared read-only by all concurrent requests.
pub struct GeoGateService {
    extractor: IpExtractor,
    resolver: Arc<dyn LocationResolver>,
    policy: Arc<Policy>,
}

impl GeoGateService {
    pub fn new(
        extractor: IpExtractor,
        resolver: Arc<dyn LocationResolver>,
        policy: Arc<Policy>,
    ) -> Self {
        Self {
            extractor,
            resolver,
            policy,
        }
    }

    /// Decide what to do with one request.
    ///
    /// Never fails: every failure is folded into `Decision::Error`.
    /// Dropping the returned future abandons any lookup in flight.
    pub async fn decide<M>(&self, meta: &M) -> Decision
    where
        M: RequestMetadata + ?Sized,
    {
        let ip = match self.extractor.extract_and_validate(meta) {
            Ok(ip) => ip,
            Err(AddressError::Missing) => {
                tracing::error!(sources = ?self.extractor.sources(), "no client IP address found");
                return Decision::Error {
                    status: STATUS_BAD_REQUEST,
                    message: MSG_NO_IP.to_string(),
                };
            }
            Err(AddressError::Malformed(candidate)) => {
                tracing::error!(candidate = %candidate, "invalid client IP address");
                return Decision::Error {
                    status: STATUS_BAD_REQUEST,
                    message: MSG_INVALID_IP.to_string(),
                };
            }
        };

        tracing::debug!(ip = %ip, "using IP address for geolocation");

        let location = match self.resolver.resolve(&ip).await {
            Ok(location) => location,
            Err(e) => {
                tracing::error!(ip = %ip, error = %e, "geoip lookup failed");
                return Decision::Error {
                    status: STATUS_INTERNAL_ERROR,
                    message: MSG_LOOKUP_FAILED.to_string(),
                };
            }
        };

        if AllowListEvaluator::evaluate(&location, &self.policy) {
            tracing::info!(
                ip = %ip,
                country = %location.country,
                city = %location.city,
                "allowed request"
            );
            Decision::Allow(GeoContext { ip, location })
        } else {
            tracing::warn!(
                ip = %ip,
                country = %location.country,
                city = %location.city,
                "denying request"
            );
            Decision::Deny {
                status: self.policy.denied_status(),
                message: self.policy.denied_message().to_string(),
            }
        }
    }
}

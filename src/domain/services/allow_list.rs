//! Allow-list evaluation
//!
//! Pure decision logic: given a resolved location and the policy, decide
//! whether the client may proceed.

use crate::domain::entities::LocationRecord;
use crate::domain::policy::Policy;
use crate::domain::value_objects::{Coordinate, Geofence};

/// Mean Earth radius (IUGG), in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two points, in kilometers (haversine).
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1.0 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Evaluates a location against the allow-list policy.
///
/// **Categories combine with OR, not AND.** A request is allowed as soon as
/// ANY configured category matches: a client inside an allowed geofence is
/// let through even when its country is not on the country list. A category
/// with no entries imposes no restriction and takes no part in the vote;
/// when every category is empty, everything is allowed.
///
/// | category    | matches when                                        |
/// |-------------|-----------------------------------------------------|
/// | countries   | `location.country` is listed (exact, case-sensitive) |
/// | cities      | `location.city` is listed (exact, case-sensitive)    |
/// | coordinates | latitude AND longitude equal a listed pair exactly  |
/// | geofences   | distance to a center is `<= radius_km`              |
///
/// Coordinate matching has no tolerance. Use a small geofence for that.
/// Requiring several categories at once (AND) has to be layered on top of
/// this evaluator.
pub struct AllowListEvaluator;

impl AllowListEvaluator {
    pub fn evaluate(location: &LocationRecord, policy: &Policy) -> bool {
        if policy.is_unrestricted() {
            return true;
        }

        let country_ok = !policy.countries().is_empty()
            && policy.countries().contains(&location.country);
        let city_ok = !policy.cities().is_empty() && policy.cities().contains(&location.city);
        let coord_ok = Self::matches_coordinate(location.coordinate(), policy.coordinates());
        let geofence_ok = Self::within_any_geofence(location.coordinate(), policy.geofences());

        country_ok || city_ok || coord_ok || geofence_ok
    }

    /// Exact floating-point match against any listed pair.
    #[allow(clippy::float_cmp)]
    pub fn matches_coordinate(point: Coordinate, allowed: &[Coordinate]) -> bool {
        allowed.iter().any(|c| c.lat == point.lat && c.lon == point.lon)
    }

    pub fn within_any_geofence(point: Coordinate, fences: &[Geofence]) -> bool {
        fences
            .iter()
            .any(|fence| haversine_km(point, fence.center()) <= fence.radius_km)
    }
}

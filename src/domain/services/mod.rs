mod allow_list;
mod ip_extractor;

pub use allow_list::{haversine_km, AllowListEvaluator, EARTH_RADIUS_KM};
pub use ip_extractor::{AddressError, HeaderValue, IpExtractor, RequestMetadata};

//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared across requests.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A client address that passed syntactic validation.
///
/// Only two textual forms are accepted:
/// - IPv4 dotted quad, four groups of 1-3 digits, each at most 255
/// - IPv6 in full form, exactly eight groups of 1-4 hex digits
///
/// Compressed IPv6 (`::1`), zone ids and IPv4-mapped tails are rejected.
/// The lookup service is keyed by the text, so the trimmed original is kept
/// alongside the parsed address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIp {
    text: String,
    addr: IpAddr,
}

impl ClientIp {
    /// Validate a candidate address. Surrounding whitespace is ignored.
    ///
    /// # Examples
    /// ```
    /// use geo_gate::domain::value_objects::ClientIp;
    ///
    /// assert!(ClientIp::parse("115.240.90.163").is_some());
    /// assert!(ClientIp::parse("256.256.256.256").is_none());
    /// assert!(ClientIp::parse("::1").is_none());
    /// ```
    pub fn parse(candidate: &str) -> Option<Self> {
        let text = candidate.trim();
        let addr = parse_ipv4(text)
            .map(IpAddr::V4)
            .or_else(|| parse_ipv6(text).map(IpAddr::V6))?;

        Some(Self {
            text: text.to_string(),
            addr,
        })
    }

    /// Wrap an address that is already parsed, e.g. a transport peer.
    ///
    /// IPv6 is rendered in full eight-group form so the text satisfies the
    /// same syntax rules as header-supplied addresses.
    pub fn from_addr(addr: IpAddr) -> Self {
        let text = match addr {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => v6
                .segments()
                .iter()
                .map(|s| format!("{:x}", s))
                .collect::<Vec<_>>()
                .join(":"),
        };
        Self { text, addr }
    }

    /// The address as the client sent it (trimmed).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut groups = text.split('.');

    for octet in octets.iter_mut() {
        let group = groups.next()?;
        if group.is_empty() || group.len() > 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = group.parse::<u8>().ok()?;
    }

    if groups.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

fn parse_ipv6(text: &str) -> Option<Ipv6Addr> {
    let mut hextets = [0u16; 8];
    let mut groups = text.split(':');

    for hextet in hextets.iter_mut() {
        let group = groups.next()?;
        if group.is_empty() || group.len() > 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        *hextet = u16::from_str_radix(group, 16).ok()?;
    }

    if groups.next().is_some() {
        return None;
    }

    Some(Ipv6Addr::from(hextets))
}

/// An exact latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A circular allowed region: center in degrees, radius in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "radiusKm", alias = "radius")]
    pub radius_km: f64,
}

impl Geofence {
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Self {
        Self { lat, lon, radius_km }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Where a candidate client address may be read from.
///
/// Request headers are client-controlled and trivially spoofed unless a
/// trusted proxy overwrites them, so the order of sources is a deployment
/// decision. The extractor walks them in the configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSource {
    /// A dedicated header carrying one address (e.g. `ip`, `x-real-ip`)
    Header(String),
    /// First entry of `X-Forwarded-For`
    ForwardedFor,
    /// Transport-level peer address
    PeerAddr,
}

impl IpSource {
    /// Parse a source from its config form:
    /// `header:<name>`, `forwarded-for` or `peer`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("header:") {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            return Some(Self::Header(name.to_ascii_lowercase()));
        }

        match s.to_ascii_lowercase().as_str() {
            "forwarded-for" | "x-forwarded-for" => Some(Self::ForwardedFor),
            "peer" => Some(Self::PeerAddr),
            _ => None,
        }
    }
}

impl std::fmt::Display for IpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header(name) => write!(f, "header:{}", name),
            Self::ForwardedFor => f.write_str("forwarded-for"),
            Self::PeerAddr => f.write_str("peer"),
        }
    }
}

//! Client address extraction
//!
//! Reads a candidate address from request metadata, walking a configured
//! list of trusted sources in order, and validates it.

use crate::domain::value_objects::{ClientIp, IpSource};
use std::net::IpAddr;

/// The value of one request header as seen by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderValue<'a> {
    Text(&'a str),
    /// Present, but not representable as UTF-8
    Opaque,
}

/// Read access to the parts of a request the gate needs.
///
/// Implemented by the inbound adapter over whatever request type the
/// HTTP framework provides.
pub trait RequestMetadata {
    /// Look up a header by lowercase name.
    fn header(&self, name: &str) -> Option<HeaderValue<'_>>;

    /// Transport-level peer address, if known.
    fn peer_addr(&self) -> Option<IpAddr>;
}

/// Why no client address could be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("no client address found")]
    Missing,
    #[error("malformed client address {0:?}")]
    Malformed(String),
}

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Extracts and validates the client address.
///
/// The first source yielding a non-empty candidate is authoritative: if
/// that candidate is malformed the extraction fails rather than falling
/// back to a less trusted source. Absent or blank sources are skipped.
#[derive(Debug, Clone)]
pub struct IpExtractor {
    sources: Vec<IpSource>,
}

impl IpExtractor {
    pub fn new(sources: Vec<IpSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[IpSource] {
        &self.sources
    }

    pub fn extract_and_validate<M>(&self, meta: &M) -> Result<ClientIp, AddressError>
    where
        M: RequestMetadata + ?Sized,
    {
        for source in &self.sources {
            let candidate = match Self::candidate(source, meta) {
                Some(c) => c,
                None => continue,
            };

            return match candidate {
                Candidate::Text(text) => {
                    ClientIp::parse(&text).ok_or(AddressError::Malformed(text))
                }
                Candidate::Peer(addr) => Ok(ClientIp::from_addr(addr)),
                Candidate::Opaque => Err(AddressError::Malformed(String::new())),
            };
        }

        Err(AddressError::Missing)
    }

    fn candidate<M>(source: &IpSource, meta: &M) -> Option<Candidate>
    where
        M: RequestMetadata + ?Sized,
    {
        match source {
            IpSource::Header(name) => match meta.header(name)? {
                HeaderValue::Text(v) => non_blank(v),
                HeaderValue::Opaque => Some(Candidate::Opaque),
            },
            IpSource::ForwardedFor => match meta.header(FORWARDED_FOR)? {
                // First hop is the original client
                HeaderValue::Text(v) => non_blank(v.split(',').next().unwrap_or_default()),
                HeaderValue::Opaque => Some(Candidate::Opaque),
            },
            IpSource::PeerAddr => meta.peer_addr().map(Candidate::Peer),
        }
    }
}

impl Default for IpExtractor {
    fn default() -> Self {
        Self::new(vec![IpSource::Header("ip".to_string())])
    }
}

enum Candidate {
    Text(String),
    Peer(IpAddr),
    Opaque,
}

fn non_blank(v: &str) -> Option<Candidate> {
    let v = v.trim();
    if v.is_empty() {
        None
    } else {
        Some(Candidate::Text(v.to_string()))
    }
}

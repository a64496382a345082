//! Location Resolver Port
//!
//! Defines the interface for resolving client addresses to locations.

use crate::domain::entities::LocationRecord;
use crate::domain::value_objects::ClientIp;
use async_trait::async_trait;

/// Why a lookup produced no usable record.
///
/// The text is meant for logs. Callers of the gate only ever see a fixed
/// message.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup transport error: {0}")]
    Transport(String),
    #[error("lookup timed out")]
    Timeout,
    #[error("lookup service answered with status {0}")]
    Status(u16),
    #[error("lookup response could not be decoded: {0}")]
    Decode(String),
    #[error("no location known for {0}")]
    NotFound(String),
}

/// Resolver for client address to location.
///
/// This is an outbound port. One long-lived instance is shared by all
/// requests, so implementations must be cheap to call concurrently.
/// Implementations make exactly one attempt per call and never return a
/// partially populated record.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolve a validated address to a complete location record.
    async fn resolve(&self, ip: &ClientIp) -> Result<LocationRecord, LookupError>;
}

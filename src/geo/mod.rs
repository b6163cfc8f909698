//! IP geolocation
//!
//! [`CountryResolver`] maps a caller address to a country code. The shipped
//! implementation queries an ipapi-compatible HTTP endpoint with retries.

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

pub mod ipapi;

pub use ipapi::{IpApiResolver, RetryPolicy};

/// Lookup failed: transport error after retries, bad status, or unreadable body.
#[derive(Debug, Error)]
#[error("country resolution failed: {0}")]
pub struct ResolveError(#[source] pub anyhow::Error);

/// Resolve an IP address to a country code.
///
/// The code is returned as the remote service reported it; callers normalize
/// case and whitespace.
#[async_trait]
pub trait CountryResolver: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> Result<String, ResolveError>;
}

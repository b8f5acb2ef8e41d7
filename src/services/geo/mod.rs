pub mod ip_lookup;
pub mod position;
pub mod reverse_geocode;

use std::time::Duration;

use anyhow::{Context, Result};

pub use ip_lookup::{ExternalIpLocator, IpLocator};
pub use position::{PositionError, PositionSource, ReportedPosition};
pub use reverse_geocode::{ExternalReverseGeocoder, ReverseGeocoder};

/// Shared HTTP client for the lookups
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

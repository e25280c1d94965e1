// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS system.
//
// ## Architecture
//
// Asks an address-echo service (by default api.ipify.org / api6.ipify.org)
// for the public address, once per record type per run. The body must be
// the bare address literal; surrounding whitespace is tolerated.
//
// Address services are untrusted. Whatever comes back is validated with
// [`ddns_core::address`] and a malformed value is reported, never used.

use async_trait::async_trait;
use ddns_core::address::{validate_ipv4, validate_ipv6};
use ddns_core::{DesiredState, IpSource, Result};
use ddns_http::HttpClient;

/// HTTP-based public address source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// IPv4 echo service
    ipv4_url: String,

    /// IPv6 echo service
    ipv6_url: String,

    /// HTTP client
    client: HttpClient,
}

impl HttpIpSource {
    /// Create a source with explicit service URLs
    pub fn new(
        ipv4_url: impl Into<String>,
        ipv6_url: impl Into<String>,
        client: HttpClient,
    ) -> Self {
        Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        }
    }

    /// Create a source for the services named in a desired state
    pub fn from_desired(desired: &DesiredState, client: HttpClient) -> Self {
        Self::new(desired.ipv4_url.clone(), desired.ipv6_url.clone(), client)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching public address from {}", url);
        self.client.get(url, None).await
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn resolve_v4(&self) -> Result<String> {
        let body = self.fetch(&self.ipv4_url).await?;
        validate_ipv4(&body)
    }

    async fn resolve_v6(&self) -> Result<String> {
        let body = self.fetch(&self.ipv6_url).await?;
        validate_ipv6(&body)
    }
}

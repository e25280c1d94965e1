// # DNS Provider Trait
//
// Defines the interface to the DNS provider's management API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, RecordPayload, RecordType};
//
// let zone_id = provider.find_zone("example.com").await?;
// let record_id = provider
//     .find_record(&zone_id, RecordType::A, "home.example.com")
//     .await?;
// ```

use async_trait::async_trait;

use crate::config::{ProxyPolicy, RecordType};

/// Body of a create or update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPayload {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// Address literal
    pub content: String,
    /// TTL in seconds
    pub ttl: u32,
    /// Proxy flag; `None` omits the field so the provider keeps its value
    pub proxied: Option<bool>,
}

impl RecordPayload {
    /// Build a payload, translating the proxy policy
    pub fn new(
        record_type: RecordType,
        name: impl Into<String>,
        content: impl Into<String>,
        ttl: u32,
        proxy: ProxyPolicy,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            ttl,
            proxied: proxy.as_payload(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Each method is a single logical API call (the HTTP adapter underneath may
/// retry at the transport level). Providers hold no cache and make no
/// decisions: which identifiers to trust and when to write are owned by the
/// [`Reconciler`](crate::Reconciler).
///
/// # Errors
///
/// - Transport exhaustion surfaces as `Error::Network`
/// - Mutating calls that report non-success surface as `Error::Apply`
/// - Lookups that report non-success surface as `Error::Provider`
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Verify the API token is active. Fails with `Error::Authorization`.
    async fn verify_token(&self) -> Result<(), crate::Error>;

    /// Check that a zone identifier exists and is accessible.
    ///
    /// Returns `Ok(false)` when the provider answers but does not report
    /// success for this identifier.
    async fn verify_zone(&self, zone_id: &str) -> Result<bool, crate::Error>;

    /// Look up a zone identifier by zone name.
    ///
    /// Fails with `Error::ZoneNotFound` when there is no match or the match
    /// carries no identifier.
    async fn find_zone(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Look up a record identifier by zone, type and name.
    ///
    /// `Ok(None)` means no such record exists yet.
    async fn find_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<String>, crate::Error>;

    /// Create a record, returning its new identifier
    async fn create_record(
        &self,
        zone_id: &str,
        payload: &RecordPayload,
    ) -> Result<String, crate::Error>;

    /// Update an existing record in place
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP address-echo services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// let v4 = source.resolve_v4().await?;
// let v6 = source.resolve_v6().await?;
// ```

use async_trait::async_trait;

use crate::config::RecordType;

/// Trait for IP source implementations
///
/// Implementations return validated address literals (see
/// [`crate::address`]). A value that fails validation must surface as
/// `Error::InvalidAddress` carrying the raw value, never a coerced address.
/// Transport failures surface as `Error::Network`.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Current public IPv4 address
    async fn resolve_v4(&self) -> Result<String, crate::Error>;

    /// Current public IPv6 address
    async fn resolve_v6(&self) -> Result<String, crate::Error>;

    /// Address matching a record type (A → IPv4, AAAA → IPv6)
    async fn resolve(&self, record_type: RecordType) -> Result<String, crate::Error> {
        match record_type {
            RecordType::A => self.resolve_v4().await,
            RecordType::Aaaa => self.resolve_v6().await,
        }
    }
}

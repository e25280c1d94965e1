//! Zone and record identity resolution
//!
//! Provider identifiers are resolved with a cache-then-verify-then-query
//! posture:
//!
//! 1. An explicitly configured zone ID wins, if it verifies
//! 2. Otherwise the cached zone ID, if it verifies (else the entry is dropped)
//! 3. Otherwise a lookup by zone name, whose result is cached
//!
//! Record IDs are taken from the cache without verification. There is no
//! cheaper liveness check than the update itself, so a stale record ID is
//! detected reactively when an update using it fails.

use tracing::{debug, info, warn};

use crate::config::{DesiredState, RecordType};
use crate::error::Result;
use crate::traits::{DnsProvider, RecordState, StateStore};

/// What is known about the managed record before deciding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    /// Provider record ID, if the record exists
    pub record_id: Option<String>,
    /// Address applied by the last successful run
    pub last_ip: Option<String>,
}

/// Resolves provider identifiers, consulting and maintaining the caches
pub struct IdentityResolver<'a> {
    provider: &'a dyn DnsProvider,
    state_store: &'a dyn StateStore,
}

impl<'a> IdentityResolver<'a> {
    /// Create a resolver over a provider and a state store
    pub fn new(provider: &'a dyn DnsProvider, state_store: &'a dyn StateStore) -> Self {
        Self {
            provider,
            state_store,
        }
    }

    /// Resolve the zone ID for the desired state
    pub async fn resolve_zone_id(&self, desired: &DesiredState) -> Result<String> {
        let zone_name = cache_zone_key(&desired.zone_name);
        let explicit = desired.explicit_zone_id();

        if let Some(zone_id) = explicit {
            if self.provider.verify_zone(zone_id).await? {
                debug!("Using configured zone ID for {}", zone_name);
                return Ok(zone_id.to_string());
            }
            warn!(
                "Configured zone ID {} failed verification for {}; falling back",
                zone_id, zone_name
            );
        }

        if let Some(cached) = self.state_store.get_zone_id(&zone_name).await? {
            // Never re-trust the identifier that just failed
            if Some(cached.as_str()) != explicit && self.provider.verify_zone(&cached).await? {
                debug!("Using cached zone ID for {}", zone_name);
                return Ok(cached);
            }
            warn!("Cached zone ID for {} is invalid; discarding it", zone_name);
            self.state_store.delete_zone_id(&zone_name).await?;
        }

        debug!("Looking up zone ID for {}", zone_name);
        let zone_id = self.provider.find_zone(&zone_name).await?;
        self.state_store.set_zone_id(&zone_name, &zone_id).await?;
        info!("Resolved zone {} to {}", zone_name, zone_id);

        Ok(zone_id)
    }

    /// Resolve the record ID, preferring the cache
    pub async fn resolve_record_id(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<RecordIdentity> {
        let cached = self.state_store.get_record(record_name, record_type).await?;
        let last_ip = cached.as_ref().and_then(|state| state.last_ip.clone());

        if let Some(record_id) = cached.and_then(|state| state.record_id) {
            debug!("Using cached {} record ID for {}", record_type, record_name);
            return Ok(RecordIdentity {
                record_id: Some(record_id),
                last_ip,
            });
        }

        let record_id = self
            .provider
            .find_record(zone_id, record_type, record_name)
            .await?;

        // The found ID is cached by the apply step, together with the address
        match &record_id {
            Some(id) => debug!("Found {} record {} for {}", record_type, id, record_name),
            None => info!("No {} record exists for {}", record_type, record_name),
        }

        Ok(RecordIdentity { record_id, last_ip })
    }

    /// Re-resolve the record ID from the provider, bypassing the cache.
    ///
    /// The cache entry is overwritten with the fresh ID (without an applied
    /// address, since the last write is now suspect) or deleted when the
    /// record no longer exists.
    pub async fn refresh_record_id(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<String>> {
        let record_id = self
            .provider
            .find_record(zone_id, record_type, record_name)
            .await?;

        match &record_id {
            Some(id) => {
                self.state_store
                    .set_record(record_name, record_type, &RecordState::identified(id.clone(), None))
                    .await?;
            }
            None => {
                self.state_store.delete_record(record_name, record_type).await?;
            }
        }

        Ok(record_id)
    }
}

/// Normalized zone name used as the zone cache key and lookup name
fn cache_zone_key(zone_name: &str) -> String {
    zone_name.trim().trim_end_matches('.').to_ascii_lowercase()
}

// # State Store Trait
//
// Defines the interface for the run-to-run caches.
//
// ## Purpose
//
// Two cache families avoid redundant work across invocations:
// - Per (record name, record type): the last applied address and the
//   provider's record identifier
// - Per zone name: the provider's zone identifier
//
// Neither is authoritative. The engine deletes or overwrites an entry as
// soon as it fails a liveness check or an update using it fails.
//
// ## Implementations
//
// - File-based: one JSON file per key (`FileStateStore`)
// - In-memory: `MemoryStateStore`

use async_trait::async_trait;

use crate::config::RecordType;

/// Cached runtime state for one record type of the managed name
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecordState {
    /// Address applied by the last successful create/update
    pub last_ip: Option<String>,
    /// Provider record identifier
    pub record_id: Option<String>,
    /// When this entry was last written
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl RecordState {
    /// State after a successful create or update
    pub fn applied(record_id: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            last_ip: Some(ip.into()),
            record_id: Some(record_id.into()),
            last_updated: chrono::Utc::now(),
        }
    }

    /// State carrying only a freshly looked-up identifier
    pub fn identified(record_id: impl Into<String>, last_ip: Option<String>) -> Self {
        Self {
            last_ip,
            record_id: Some(record_id.into()),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// No locking is applied across invocations; the external scheduler is
/// expected not to overlap runs for the same configuration.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get cached state for a record name and type
    async fn get_record(
        &self,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RecordState>, crate::Error>;

    /// Create or overwrite cached state for a record name and type
    async fn set_record(
        &self,
        record_name: &str,
        record_type: RecordType,
        state: &RecordState,
    ) -> Result<(), crate::Error>;

    /// Delete cached state (no-op when absent)
    async fn delete_record(
        &self,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<(), crate::Error>;

    /// Get the cached zone identifier for a zone name
    async fn get_zone_id(&self, zone_name: &str) -> Result<Option<String>, crate::Error>;

    /// Cache a zone identifier
    async fn set_zone_id(&self, zone_name: &str, zone_id: &str) -> Result<(), crate::Error>;

    /// Delete a cached zone identifier (no-op when absent)
    async fn delete_zone_id(&self, zone_name: &str) -> Result<(), crate::Error>;
}

// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Provides a simple, fast state store that doesn't persist across runs.
// Useful for testing and for embedding the reconciler in a long-lived
// process that keeps the store alive between passes.
//
// ## Crash Behavior
//
// - All state is lost on exit
// - The next run resolves identifiers from the provider again and treats
//   the address as changed (one redundant update)

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::config::RecordType;
use crate::traits::state_store::{StateStore, RecordState};
use crate::Error;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<(String, RecordType), RecordState>,
    zones: HashMap<String, String>,
}

/// In-memory state store implementation
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached record entries
    pub async fn record_count(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Clear all entries from the store
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.records.clear();
        guard.zones.clear();
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(
        &self,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RecordState>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .records
            .get(&(record_name.to_string(), record_type))
            .cloned())
    }

    async fn set_record(
        &self,
        record_name: &str,
        record_type: RecordType,
        state: &RecordState,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .records
            .insert((record_name.to_string(), record_type), state.clone());
        Ok(())
    }

    async fn delete_record(&self, record_name: &str, record_type: RecordType) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.records.remove(&(record_name.to_string(), record_type));
        Ok(())
    }

    async fn get_zone_id(&self, zone_name: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.zones.get(zone_name).cloned())
    }

    async fn set_zone_id(&self, zone_name: &str, zone_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.zones.insert(zone_name.to_string(), zone_id.to_string());
        Ok(())
    }

    async fn delete_zone_id(&self, zone_name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.zones.remove(zone_name);
        Ok(())
    }
}

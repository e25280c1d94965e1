// # File State Store
//
// File-based implementation of StateStore.
//
// ## Purpose
//
// Keeps zone and record identifiers, plus the last applied address, across
// invocations so the steady-state run needs no lookups and no writes.
//
// ## Layout
//
// One small JSON file per key inside the cache directory:
//
// ```text
// <cache_dir>/record_home.example.com_A.json
// <cache_dir>/record_home.example.com_AAAA.json
// <cache_dir>/zone_example.com.json
// ```
//
// Names are sanitized so any record name maps to a single safe filename.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename per entry
// - Corruption: an unreadable entry is logged and treated as absent; the
//   engine re-resolves from the provider and overwrites it

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::RecordType;
use crate::traits::state_store::{RecordState, StateStore};

/// Entry file format version
/// Used for future migration if format changes
const STATE_FILE_VERSION: &str = "1.0";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct RecordEntry {
    version: String,
    #[serde(flatten)]
    state: RecordState,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ZoneEntry {
    version: String,
    zone_id: String,
    last_updated: chrono::DateTime<chrono::Utc>,
}

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::config::RecordType;
/// use ddns_core::state::FileStateStore;
/// use ddns_core::traits::{RecordState, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/cache/ddns-sync").await?;
///
///     let state = RecordState::applied("372e67954025e0ba6aaa6d586b9e0b59", "1.2.3.4");
///     store.set_record("home.example.com", RecordType::A, &state).await?;
///
///     let cached = store.get_record("home.example.com", RecordType::A).await?;
///     assert_eq!(cached, Some(state));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            fs::create_dir_all(&dir).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create cache directory {}: {e}",
                    dir.display()
                ))
            })?;
        }

        Ok(Self { dir })
    }

    /// The cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for a record name and type
    pub fn record_path(&self, record_name: &str, record_type: RecordType) -> PathBuf {
        self.dir.join(format!(
            "record_{}_{}.json",
            sanitize_key(record_name),
            record_type
        ))
    }

    /// Path of the entry for a zone name
    pub fn zone_path(&self, zone_name: &str) -> PathBuf {
        self.dir.join(format!("zone_{}.json", sanitize_key(zone_name)))
    }

    /// Read and parse an entry. Missing or corrupt entries are `None`.
    async fn read_entry<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!("Cache entry does not exist: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "Failed to read cache entry {}: {e}",
                    path.display()
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(
                    "Cache entry {} is corrupted ({}). Ignoring it.",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Write an entry atomically
    async fn write_entry<T: serde::Serialize>(path: &Path, entry: &T) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| Error::state_store(format!("Failed to serialize cache entry: {e}")))?;

        let mut temp_path = path.to_path_buf();
        temp_path.set_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {e}",
                    temp_path.display()
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {e}",
                    temp_path.display()
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {e}",
                    temp_path.display()
                ))
            })?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {e}",
                temp_path.display(),
                path.display()
            ))
        })?;

        tracing::trace!("Cache entry written: {}", path.display());
        Ok(())
    }

    async fn remove_entry(path: &Path) -> Result<(), Error> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::state_store(format!(
                "Failed to delete cache entry {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Map a DNS name to a filesystem-safe key.
///
/// Lowercases and replaces everything outside `[a-z0-9._-]` with `_`.
pub fn sanitize_key(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_record(
        &self,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RecordState>, Error> {
        let path = self.record_path(record_name, record_type);
        let entry: Option<RecordEntry> = Self::read_entry(&path).await?;
        Ok(entry.map(|entry| entry.state))
    }

    async fn set_record(
        &self,
        record_name: &str,
        record_type: RecordType,
        state: &RecordState,
    ) -> Result<(), Error> {
        let entry = RecordEntry {
            version: STATE_FILE_VERSION.to_string(),
            state: state.clone(),
        };
        Self::write_entry(&self.record_path(record_name, record_type), &entry).await
    }

    async fn delete_record(&self, record_name: &str, record_type: RecordType) -> Result<(), Error> {
        Self::remove_entry(&self.record_path(record_name, record_type)).await
    }

    async fn get_zone_id(&self, zone_name: &str) -> Result<Option<String>, Error> {
        let entry: Option<ZoneEntry> = Self::read_entry(&self.zone_path(zone_name)).await?;
        Ok(entry
            .map(|entry| entry.zone_id)
            .filter(|zone_id| !zone_id.is_empty()))
    }

    async fn set_zone_id(&self, zone_name: &str, zone_id: &str) -> Result<(), Error> {
        let entry = ZoneEntry {
            version: STATE_FILE_VERSION.to_string(),
            zone_id: zone_id.to_string(),
            last_updated: chrono::Utc::now(),
        };
        Self::write_entry(&self.zone_path(zone_name), &entry).await
    }

    async fn delete_zone_id(&self, zone_name: &str) -> Result<(), Error> {
        Self::remove_entry(&self.zone_path(zone_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_record_roundtrip_across_instances() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("cache")).await.unwrap();

        assert_eq!(
            store.get_record("home.example.com", RecordType::A).await.unwrap(),
            None
        );

        let state = RecordState::applied("rec-1", "1.2.3.4");
        store
            .set_record("home.example.com", RecordType::A, &state)
            .await
            .unwrap();
        assert!(store.record_path("home.example.com", RecordType::A).exists());

        let reopened = FileStateStore::new(dir.path().join("cache")).await.unwrap();
        assert_eq!(
            reopened.get_record("home.example.com", RecordType::A).await.unwrap(),
            Some(state)
        );
        assert_eq!(
            reopened.get_record("home.example.com", RecordType::Aaaa).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_file_store_zone_delete() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        store.set_zone_id("example.com", "zone-1").await.unwrap();
        assert_eq!(
            store.get_zone_id("example.com").await.unwrap(),
            Some("zone-1".to_string())
        );

        store.delete_zone_id("example.com").await.unwrap();
        assert_eq!(store.get_zone_id("example.com").await.unwrap(), None);

        // Deleting twice is fine
        store.delete_zone_id("example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupted_entry_is_absent() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        fs::write(store.zone_path("example.com"), b"corrupted json data")
            .await
            .unwrap();

        assert_eq!(store.get_zone_id("example.com").await.unwrap(), None);
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("Home.Example.com"), "home.example.com");
        assert_eq!(sanitize_key("*.example.com"), "_.example.com");
        assert_eq!(sanitize_key("../etc/passwd"), ".._etc_passwd");
    }

    #[tokio::test]
    async fn test_paths_are_deterministic() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        assert_eq!(
            store.record_path("home.example.com", RecordType::Aaaa),
            dir.path().join("record_home.example.com_AAAA.json")
        );
        assert_eq!(
            store.zone_path("example.com"),
            dir.path().join("zone_example.com.json")
        );
    }
}

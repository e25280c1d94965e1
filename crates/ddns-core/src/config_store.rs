// # Config Store
//
// Loads and persists the desired state as a TOML file.
//
// ## Credential confidentiality
//
// The file holds the provider API token. It is written to a sibling temp
// file that is created with mode 0600 before any byte lands in it, then
// renamed over the destination. A crash mid-write leaves at worst an
// owner-only temp file behind, never a partially-written world-readable
// credential. The parent directory is created with mode 0700.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::DesiredState;
use crate::error::{Error, Result};

/// Owner read/write only
#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;

/// Owner-only directory
#[cfg(unix)]
const CONFIG_DIR_MODE: u32 = 0o700;

/// File-backed store for [`DesiredState`]
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the given config file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the desired state.
    ///
    /// Returns `Ok(None)` when no config file exists yet. The record name is
    /// re-derived from zone name and subdomain; the persisted value is never
    /// trusted.
    pub async fn load(&self) -> Result<Option<DesiredState>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::config(format!(
                    "Failed to read config file {}: {e}",
                    self.path.display()
                )));
            }
        };

        let mut state: DesiredState = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file {}: {e}",
                self.path.display()
            ))
        })?;
        state.refresh_record_name();

        Ok(Some(state))
    }

    /// Persist the desired state with owner-only permissions
    pub async fn persist(&self, state: &DesiredState) -> Result<()> {
        let mut state = state.clone();
        state.refresh_record_name();

        let body = toml::to_string_pretty(&state)
            .map_err(|e| Error::state_store(format!("Failed to serialize config: {e}")))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            create_private_dir(parent).await?;
        }

        let temp_path = self.temp_path();
        // A stale temp file may carry looser permissions from elsewhere
        if let Err(e) = fs::remove_file(&temp_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            return Err(Error::state_store(format!(
                "Failed to remove stale temp file {}: {e}",
                temp_path.display()
            )));
        }

        {
            let mut file = open_private(&temp_path).await?;
            file.write_all(body.as_bytes()).await.map_err(|e| {
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

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {e}",
                temp_path.display(),
                self.path.display()
            ))
        })?;

        tracing::info!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("toml.tmp");
        temp
    }
}

#[cfg(unix)]
async fn open_private(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(CONFIG_FILE_MODE)
        .open(path)
        .await
        .map_err(|e| Error::state_store(format!("Failed to create {}: {e}", path.display())))
}

#[cfg(not(unix))]
async fn open_private(path: &Path) -> Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| Error::state_store(format!("Failed to create {}: {e}", path.display())))
}

#[cfg(unix)]
async fn create_private_dir(path: &Path) -> Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(CONFIG_DIR_MODE)
        .create(path)
        .await
        .map_err(|e| {
            Error::state_store(format!(
                "Failed to create config directory {}: {e}",
                path.display()
            ))
        })
}

#[cfg(not(unix))]
async fn create_private_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to create config directory {}: {e}",
            path.display()
        ))
    })
}

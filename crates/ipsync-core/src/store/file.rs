// # File-backed stores
//
// Durable storage for the configuration document and the observed-IP
// state. Both use write-to-temp-then-rename so a crash mid-write never
// leaves a truncated document behind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::SyncConfig;
use crate::traits::{ConfigStore, IpStateStore};

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    let mut temp = path.to_path_buf();
    temp.set_extension("tmp");
    {
        let mut file = fs::File::create(&temp).await.map_err(|e| {
            Error::storage(format!("failed to create {}: {}", temp.display(), e))
        })?;
        file.write_all(contents).await.map_err(|e| {
            Error::storage(format!("failed to write {}: {}", temp.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            Error::storage(format!("failed to flush {}: {}", temp.display(), e))
        })?;
    }

    fs::rename(&temp, path).await.map_err(|e| {
        Error::storage(format!(
            "failed to rename {} to {}: {}",
            temp.display(),
            path.display(),
            e
        ))
    })
}

/// Configuration document stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Create a store backed by the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<SyncConfig, Error> {
        let contents = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::storage(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let config: SyncConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    async fn save(&self, config: &SyncConfig) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes()).await?;
        tracing::trace!(path = %self.path.display(), "configuration persisted");
        Ok(())
    }
}

/// Observed-IP state stored as a single plain-text line
///
/// A missing file is the "unknown" sentinel.
#[derive(Debug, Clone)]
pub struct FileIpStateStore {
    path: PathBuf,
}

impl FileIpStateStore {
    /// Create a store backed by the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl IpStateStore for FileIpStateStore {
    async fn load(&self) -> Result<Option<String>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let ip = contents.trim().to_string();
                Ok(if ip.is_empty() { None } else { Some(ip) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, ip: &str) -> Result<(), Error> {
        write_atomic(&self.path, ip.as_bytes()).await?;
        tracing::trace!(path = %self.path.display(), ip, "observed IP persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagedRecord;
    use tempfile::tempdir;

    #[tokio::test]
    async fn config_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("config.json"));

        let mut config = SyncConfig {
            auth_token: Some("tok".to_string()),
            poll_interval_ms: 1000,
            verbosity: Default::default(),
            records: vec![ManagedRecord::new("example.com", "home.example.com")],
        };
        store.save(&config).await.unwrap();

        config.records[0].zone_identifier = "z1".to_string();
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.records[0].zone_identifier, "z1");
        assert_eq!(loaded.auth_token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn ip_state_missing_file_is_unknown() {
        let dir = tempdir().unwrap();
        let store = FileIpStateStore::new(dir.path().join("last_ip.txt"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("1.2.3.4").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("1.2.3.4".to_string()));

        store.save("5.6.7.8").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("5.6.7.8".to_string()));
    }

    #[tokio::test]
    async fn stores_create_parent_directories() {
        let dir = tempdir().unwrap();
        let store = FileIpStateStore::new(dir.path().join("state/nested/last_ip.txt"));
        store.save("1.2.3.4").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("1.2.3.4".to_string()));
    }
}

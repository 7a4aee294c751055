// # In-memory stores
//
// Non-persistent ConfigStore/IpStateStore implementations for embedding
// and tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::SyncConfig;
use crate::traits::{ConfigStore, IpStateStore};

/// In-memory configuration store
#[derive(Debug, Clone)]
pub struct MemoryConfigStore {
    config: Arc<Mutex<Option<SyncConfig>>>,
}

impl MemoryConfigStore {
    /// Create a store seeded with a configuration
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(Some(config))),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<SyncConfig, Error> {
        self.config
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::storage("no configuration stored"))
    }

    async fn save(&self, config: &SyncConfig) -> Result<(), Error> {
        *self.config.lock().await = Some(config.clone());
        Ok(())
    }
}

/// In-memory observed-IP store
#[derive(Debug, Clone, Default)]
pub struct MemoryIpStateStore {
    ip: Arc<Mutex<Option<String>>>,
}

impl MemoryIpStateStore {
    /// Create a store in the "unknown" state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a last-known IP
    pub fn with_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Arc::new(Mutex::new(Some(ip.into()))),
        }
    }
}

#[async_trait]
impl IpStateStore for MemoryIpStateStore {
    async fn load(&self) -> Result<Option<String>, Error> {
        Ok(self.ip.lock().await.clone())
    }

    async fn save(&self, ip: &str) -> Result<(), Error> {
        *self.ip.lock().await = Some(ip.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_ip_store_starts_unknown() {
        let store = MemoryIpStateStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save("1.2.3.4").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("1.2.3.4".to_string()));
    }
}

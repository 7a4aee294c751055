// # Durable Storage Traits
//
// Two independent documents back the engine:
//
// - the configuration, rewritten after every resolution pass so resolved
//   identifiers survive restarts;
// - the observed-IP state, a single scalar persisted separately so it
//   survives configuration format changes.
//
// Both are mutated only by the engine's single control flow.

use async_trait::async_trait;

use crate::config::SyncConfig;

/// Durable storage for the configuration document
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration
    async fn load(&self) -> Result<SyncConfig, crate::Error>;

    /// Persist the configuration, replacing the previous document
    async fn save(&self, config: &SyncConfig) -> Result<(), crate::Error>;
}

/// Durable storage for the last observed public IP
///
/// `None` is the "unknown" sentinel: it compares as changed against any
/// freshly observed address.
#[async_trait]
pub trait IpStateStore: Send + Sync {
    /// Load the last observed IP, or `None` if never observed
    async fn load(&self) -> Result<Option<String>, crate::Error>;

    /// Persist a newly observed IP
    async fn save(&self, ip: &str) -> Result<(), crate::Error>;
}

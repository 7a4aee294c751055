// # IP Source Trait
//
// Interface to the address-discovery service. Sources fetch, they do not
// decide: change detection against the persisted state is owned by the
// engine, and the observed address is kept as the exact string the service
// returned so comparison stays byte-for-byte.

use async_trait::async_trait;

/// Trait for public-address discovery implementations
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the caller's current public IP address
    ///
    /// Returns the address as reported by the service, un-normalized.
    /// Fails with `Network` when the service is unreachable or answers
    /// with a non-success status, and with `Protocol` when the body cannot
    /// be interpreted as an address.
    async fn fetch(&self) -> Result<String, crate::Error>;
}

//! Core traits for the synchronization engine
//!
//! - [`DnsProvider`]: name lookups and record updates against the provider API
//! - [`IpSource`]: public-address discovery
//! - [`ConfigStore`] / [`IpStateStore`]: durable storage boundaries

pub mod dns_provider;
pub mod ip_source;
pub mod store;

pub use dns_provider::{DnsProvider, RecordRef, RecordUpdate, ZoneRef};
pub use ip_source::IpSource;
pub use store::{ConfigStore, IpStateStore};

// # ipsync-core
//
// Core library for the ipsync dynamic-DNS synchronization agent.
//
// ## Architecture Overview
//
// - **DnsProvider**: trait for provider name lookups and record updates
// - **IpSource**: trait for public-address discovery
// - **ConfigStore / IpStateStore**: durable storage boundaries
// - **SyncEngine**: identifier resolution, change detection, and update
//   orchestration on a single control flow
//
// ## Design Principles
//
// 1. **Single control flow**: provider calls are sequential by design, never
//    fanned out, so event ordering is deterministic
// 2. **Durable before acting**: resolved identifiers and the observed IP are
//    persisted before any dependent network call
// 3. **Nothing is fatal**: per-record failures are reported to the event log
//    and the next poll cycle is the retry mechanism
// 4. **Library-first**: the daemon is a thin shell over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{ManagedRecord, RecordType, SyncConfig, Verbosity};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use events::{LoggedEvent, SyncEvent};
pub use store::{FileConfigStore, FileIpStateStore, MemoryConfigStore, MemoryIpStateStore};
pub use traits::{ConfigStore, DnsProvider, IpSource, IpStateStore};

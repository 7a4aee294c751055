// # Store implementations
//
// File-backed stores for the daemon, in-memory stores for embedding and
// tests.

pub mod file;
pub mod memory;

pub use file::{FileConfigStore, FileIpStateStore};
pub use memory::{MemoryConfigStore, MemoryIpStateStore};

//! Error types for the synchronization engine
//!
//! This is a closed taxonomy: transport, authentication, response-shape,
//! lookup and update failures each get their own variant so callers can
//! branch on the kind of failure instead of probing message strings.

use thiserror::Error;

/// Result type alias for synchronization operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the synchronization engine
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or connectivity failure, including non-success statuses
    /// from the address-discovery service
    #[error("network error: {0}")]
    Network(String),

    /// Credential rejected by the provider, or no credential configured
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response body could not be interpreted in the expected shape
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Zone lookup returned zero matches
    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    /// Record lookup returned zero matches
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Provider answered a mutating request with a non-2xx status and a
    /// structured error body
    #[error("provider rejected request (status {status}): {detail}")]
    ProviderRejected {
        /// HTTP status code returned by the provider
        status: u16,
        /// Provider response payload, when one could be read
        detail: String,
    },

    /// Update attempted on a record whose identifiers are not yet resolved
    #[error("record {0} has unresolved identifiers, refusing to update")]
    UnresolvedRecord(String),

    /// Durable storage failure (configuration or observed-IP state)
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration is structurally invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-rejection error from a status code and payload
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::ProviderRejected {
            status,
            detail: detail.into(),
        }
    }
}

//! Configuration data model
//!
//! The configuration document is durable: provider identifiers resolved at
//! runtime are written back into it, so the serde shape here is also the
//! on-disk shape. Field names stay camelCase for compatibility with
//! existing deployments.

use serde::{Deserialize, Serialize};

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Default credential for provider API calls; individual records may
    /// override it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Poll period in milliseconds; 0 disables periodic polling and only
    /// the startup cycle runs
    #[serde(default)]
    pub poll_interval_ms: u64,

    /// Event verbosity
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Managed DNS records, in update order
    #[serde(default)]
    pub records: Vec<ManagedRecord>,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("no records configured"));
        }
        for record in &self.records {
            if record.zone_name.is_empty() {
                return Err(crate::Error::config("record with empty zoneName"));
            }
            if record.record_name.is_empty() {
                return Err(crate::Error::config("record with empty recordName"));
            }
        }
        Ok(())
    }
}

/// Event verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Report changes and failures only
    #[default]
    Normal,
    /// Additionally report no-change poll cycles
    Verbose,
}

/// One managed DNS entry
///
/// `zone_identifier`/`record_identifier` are provider-internal IDs; empty
/// means "not resolved yet". They are filled in by the resolution pass and
/// persisted so later runs skip the lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRecord {
    /// Human-readable zone, e.g. `example.com`
    pub zone_name: String,

    /// Fully-qualified hostname to update
    pub record_name: String,

    /// Address family being published
    #[serde(default)]
    pub record_type: RecordType,

    /// Provider-internal zone ID, empty when unresolved
    #[serde(default)]
    pub zone_identifier: String,

    /// Provider-internal record ID, empty when unresolved
    #[serde(default)]
    pub record_identifier: String,

    /// Per-record credential override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl ManagedRecord {
    /// Create a record with unresolved identifiers
    pub fn new(zone_name: impl Into<String>, record_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            record_name: record_name.into(),
            record_type: RecordType::A,
            zone_identifier: String::new(),
            record_identifier: String::new(),
            auth_token: None,
        }
    }

    /// Set the per-record credential
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set pre-resolved provider identifiers
    pub fn with_identifiers(
        mut self,
        zone_identifier: impl Into<String>,
        record_identifier: impl Into<String>,
    ) -> Self {
        self.zone_identifier = zone_identifier.into();
        self.record_identifier = record_identifier.into();
        self
    }

    /// Both provider identifiers are known
    pub fn is_resolved(&self) -> bool {
        !self.zone_identifier.is_empty() && !self.record_identifier.is_empty()
    }

    /// The credential this record uses: its own token if set, otherwise
    /// the configuration default
    pub fn effective_token<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.auth_token.as_deref().or(default)
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[default]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

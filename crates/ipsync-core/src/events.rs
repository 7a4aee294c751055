//! Structured event model
//!
//! Every component reports outcomes as [`SyncEvent`] values. The engine
//! stamps them with a timestamp and pushes them over a bounded channel; the
//! daemon drains that channel into an append-only log. The log is a
//! write-only sink, never read back by the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which lookup a resolution failure occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStage {
    /// Zone lookup by name
    Zone,
    /// Record lookup scoped to a zone identifier
    Record,
}

/// Events emitted by the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Engine started
    Started {
        records: usize,
        poll_interval_ms: u64,
    },

    /// Zone identifier resolved for a record
    ZoneResolved {
        record_name: String,
        zone_name: String,
        zone_identifier: String,
    },

    /// Record identifier resolved for a record
    RecordResolved {
        record_name: String,
        record_identifier: String,
    },

    /// A resolution step failed; the pass continues with the next record
    ResolveFailed {
        record_name: String,
        stage: ResolveStage,
        error: String,
    },

    /// Observed public IP differs from the persisted state
    IpChanged {
        previous: Option<String>,
        current: String,
    },

    /// Observed public IP matches the persisted state (verbose mode only)
    IpUnchanged { current: String },

    /// The address-discovery fetch failed; no update this cycle
    ObserveFailed { error: String },

    /// A record was pushed to the provider successfully
    UpdateSucceeded { record_name: String, content: String },

    /// A record update failed; remaining records are still attempted
    UpdateFailed { record_name: String, error: String },

    /// Update skipped because the record's identifiers are unresolved
    UpdateSkippedUnresolved { record_name: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// A timestamped event, the unit appended to the event log
#[derive(Debug, Clone, Serialize)]
pub struct LoggedEvent {
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// The event payload
    #[serde(flatten)]
    pub event: SyncEvent,
}

impl LoggedEvent {
    /// Stamp an event with the current time
    pub fn now(event: SyncEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

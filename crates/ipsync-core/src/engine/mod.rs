//! Synchronization engine
//!
//! The engine owns the single control flow that everything else hangs off:
//!
//! ```text
//! run()
//!  ├─ resolve_identifiers()   once, at startup
//!  ├─ poll_cycle()            once, unconditionally
//!  └─ every pollIntervalMs:
//!       poll_cycle()
//!         ├─ observe_ip()     fetch + compare + persist on change
//!         └─ push_update()    once per record, sequentially
//! ```
//!
//! All provider and discovery calls are suspend points, but no two are
//! ever in flight at once: every loop over records awaits each call before
//! issuing the next. That keeps event ordering deterministic and bounds
//! the load on the provider. The interval timer delays missed ticks, so a
//! cycle that outlasts the poll period postpones the next cycle instead of
//! overlapping it.
//!
//! No error inside a cycle is fatal. Per-record failures are reported and
//! the loop continues; observation failures degrade to "no change this
//! cycle". The next scheduled poll is the only retry mechanism.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::config::{ManagedRecord, SyncConfig, Verbosity};
use crate::error::{Error, Result};
use crate::events::{LoggedEvent, ResolveStage, SyncEvent};
use crate::traits::{ConfigStore, DnsProvider, IpSource, IpStateStore, RecordUpdate};

/// Capacity of the event channel; a full channel drops events rather than
/// stalling the control flow
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The synchronization engine
///
/// Construct with [`SyncEngine::new`], drive with [`SyncEngine::run`]. The
/// returned receiver yields every event the engine emits; the daemon
/// drains it into the append-only event log.
pub struct SyncEngine {
    /// Provider API for lookups and updates
    provider: Box<dyn DnsProvider>,

    /// Address-discovery source
    ip_source: Box<dyn IpSource>,

    /// Durable configuration document
    config_store: Box<dyn ConfigStore>,

    /// Durable last-observed-IP state
    ip_state: Box<dyn IpStateStore>,

    /// Working copy of the configuration, mutated in place as identifiers
    /// resolve
    config: SyncConfig,

    /// Event sink
    event_tx: mpsc::Sender<LoggedEvent>,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// Returns the engine and the receiving end of its event channel.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        ip_source: Box<dyn IpSource>,
        config_store: Box<dyn ConfigStore>,
        ip_state: Box<dyn IpStateStore>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<LoggedEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            provider,
            ip_source,
            config_store,
            ip_state,
            config,
            event_tx,
        };

        Ok((engine, event_rx))
    }

    /// The engine's working configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run the engine until a SIGINT is received
    ///
    /// Performs the startup resolution pass and one immediate poll cycle,
    /// then polls every `pollIntervalMs`. With an interval of 0 the engine
    /// stays alive after the startup cycle without polling, for
    /// compatibility with external process supervisors.
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with an injected shutdown channel instead of OS signals
    ///
    /// Production code should use [`SyncEngine::run`]; this exists so
    /// tests can terminate the engine deterministically.
    pub async fn run_with_shutdown(&mut self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit(SyncEvent::Started {
            records: self.config.records.len(),
            poll_interval_ms: self.config.poll_interval_ms,
        });
        info!(
            records = self.config.records.len(),
            poll_interval_ms = self.config.poll_interval_ms,
            "engine started"
        );

        if let Err(e) = self.resolve_identifiers().await {
            // Only a storage failure escapes the pass; resolved
            // identifiers stay usable in memory and the next run persists
            // them again.
            warn!(error = %e, "failed to persist resolved identifiers");
        }

        // Startup cycle, regardless of timer configuration.
        self.poll_cycle().await;

        let reason = match shutdown_rx {
            Some(rx) => self.poll_until_shutdown(rx).await,
            None => self.poll_until_signal().await,
        };

        self.emit(SyncEvent::Stopped {
            reason: reason.to_string(),
        });
        info!(reason, "engine stopped");
        Ok(())
    }

    async fn poll_until_shutdown(&mut self, mut rx: oneshot::Receiver<()>) -> &'static str {
        if self.config.poll_interval_ms == 0 {
            let _ = (&mut rx).await;
            return "shutdown signal";
        }

        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The startup cycle already ran; skip the interval's immediate tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_cycle().await,
                _ = &mut rx => return "shutdown signal",
            }
        }
    }

    async fn poll_until_signal(&mut self) -> &'static str {
        if self.config.poll_interval_ms == 0 {
            let _ = tokio::signal::ctrl_c().await;
            return "interrupt";
        }

        let mut ticker = interval(Duration::from_millis(self.config.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll_cycle().await,
                _ = tokio::signal::ctrl_c() => return "interrupt",
            }
        }
    }

    /// Resolve provider identifiers for every record that lacks them
    ///
    /// Records are processed strictly in sequence order. Zone and record
    /// lookups are independent steps: a failed zone lookup does not skip
    /// the record lookup, which is then issued against an empty zone
    /// identifier and its rejection caught like any other failure. One
    /// record's failure never aborts the pass. The configuration is
    /// persisted exactly once afterwards, partial results included.
    pub async fn resolve_identifiers(&mut self) -> Result<()> {
        let default_token = self.config.auth_token.clone();

        for idx in 0..self.config.records.len() {
            let record = self.config.records[idx].clone();
            let token = record
                .effective_token(default_token.as_deref())
                .map(str::to_string);

            if record.zone_identifier.is_empty() {
                match self.resolve_zone(&record, token.as_deref()).await {
                    Ok(zone_id) => {
                        debug!(record = %record.record_name, zone_id, "zone resolved");
                        self.config.records[idx].zone_identifier = zone_id.clone();
                        self.emit(SyncEvent::ZoneResolved {
                            record_name: record.record_name.clone(),
                            zone_name: record.zone_name.clone(),
                            zone_identifier: zone_id,
                        });
                    }
                    Err(e) => {
                        warn!(
                            record = %record.record_name,
                            zone = %record.zone_name,
                            error = %e,
                            "zone lookup failed"
                        );
                        self.emit(SyncEvent::ResolveFailed {
                            record_name: record.record_name.clone(),
                            stage: ResolveStage::Zone,
                            error: e.to_string(),
                        });
                    }
                }
            }

            if record.record_identifier.is_empty() {
                let zone_id = self.config.records[idx].zone_identifier.clone();
                match self
                    .resolve_record(&zone_id, &record, token.as_deref())
                    .await
                {
                    Ok(record_id) => {
                        debug!(record = %record.record_name, record_id, "record resolved");
                        self.config.records[idx].record_identifier = record_id.clone();
                        self.emit(SyncEvent::RecordResolved {
                            record_name: record.record_name.clone(),
                            record_identifier: record_id,
                        });
                    }
                    Err(e) => {
                        warn!(record = %record.record_name, error = %e, "record lookup failed");
                        self.emit(SyncEvent::ResolveFailed {
                            record_name: record.record_name.clone(),
                            stage: ResolveStage::Record,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        // One durable write per pass, even when some records failed.
        self.config_store.save(&self.config).await
    }

    async fn resolve_zone(&self, record: &ManagedRecord, token: Option<&str>) -> Result<String> {
        let token = token.ok_or_else(|| {
            Error::auth(format!("no credential configured for {}", record.record_name))
        })?;
        let zones = self.provider.lookup_zone(&record.zone_name, token).await?;
        // First match wins: several zones sharing a name is a tie-break,
        // not an error.
        zones
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| Error::ZoneNotFound(record.zone_name.clone()))
    }

    async fn resolve_record(
        &self,
        zone_identifier: &str,
        record: &ManagedRecord,
        token: Option<&str>,
    ) -> Result<String> {
        let token = token.ok_or_else(|| {
            Error::auth(format!("no credential configured for {}", record.record_name))
        })?;
        let records = self
            .provider
            .lookup_record(zone_identifier, &record.record_name, token)
            .await?;
        records
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| Error::RecordNotFound(record.record_name.clone()))
    }

    /// Observe the current public IP and detect a change
    ///
    /// Comparison against the persisted state is byte-for-byte on the
    /// string the discovery service returned. When the address changed the
    /// new value is persisted before this method returns, so a crash
    /// during the following updates does not re-detect the same change on
    /// the next run.
    pub async fn observe_ip(&self) -> Result<(String, bool)> {
        let current = self.ip_source.fetch().await?;
        let previous = self.ip_state.load().await?;
        let changed = previous.as_deref() != Some(current.as_str());

        if changed {
            self.ip_state.save(&current).await?;
            info!(previous = ?previous, current = %current, "public IP changed");
            self.emit(SyncEvent::IpChanged {
                previous,
                current: current.clone(),
            });
        } else if self.config.verbosity == Verbosity::Verbose {
            debug!(current = %current, "public IP unchanged");
            self.emit(SyncEvent::IpUnchanged {
                current: current.clone(),
            });
        }

        Ok((current, changed))
    }

    /// Run one poll cycle: observe the IP and, on change, push it to every
    /// record in order
    ///
    /// A failed observation means no update this cycle, not a fatal
    /// condition. Updates run sequentially and one record's failure never
    /// prevents attempting the rest.
    pub async fn poll_cycle(&self) {
        let (current, changed) = match self.observe_ip().await {
            Ok(observed) => observed,
            Err(e) => {
                warn!(error = %e, "address observation failed, skipping cycle");
                self.emit(SyncEvent::ObserveFailed {
                    error: e.to_string(),
                });
                return;
            }
        };

        if !changed {
            return;
        }

        for record in &self.config.records {
            match self.push_update(record, &current).await {
                Ok(()) => {
                    info!(record = %record.record_name, content = %current, "record updated");
                    self.emit(SyncEvent::UpdateSucceeded {
                        record_name: record.record_name.clone(),
                        content: current.clone(),
                    });
                }
                Err(Error::UnresolvedRecord(name)) => {
                    warn!(record = %name, "skipping update, identifiers unresolved");
                    self.emit(SyncEvent::UpdateSkippedUnresolved { record_name: name });
                }
                Err(e) => {
                    warn!(record = %record.record_name, error = %e, "record update failed");
                    self.emit(SyncEvent::UpdateFailed {
                        record_name: record.record_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Push the current IP to a single record
    ///
    /// Requires both provider identifiers; otherwise fails with
    /// [`Error::UnresolvedRecord`] before any network call, since a valid
    /// provider request cannot be constructed.
    pub async fn push_update(&self, record: &ManagedRecord, content: &str) -> Result<()> {
        if !record.is_resolved() {
            return Err(Error::UnresolvedRecord(record.record_name.clone()));
        }

        let token = record
            .effective_token(self.config.auth_token.as_deref())
            .ok_or_else(|| {
                Error::auth(format!("no credential configured for {}", record.record_name))
            })?;

        let update = RecordUpdate {
            identifier: record.record_identifier.clone(),
            record_type: record.record_type,
            name: record.record_name.clone(),
            content: content.to_string(),
        };

        self.provider
            .update_record(
                &record.zone_identifier,
                &record.record_identifier,
                &update,
                token,
            )
            .await
    }

    fn emit(&self, event: SyncEvent) {
        if self.event_tx.try_send(LoggedEvent::now(event)).is_err() {
            // A full channel means the log writer is behind; dropping the
            // event is preferable to stalling the control flow.
            warn!("event channel full, dropping event");
        }
    }
}

//! Test doubles and helpers shared by the contract tests
//!
//! The mocks record every provider and store interaction so tests can
//! assert call counts and ordering, and support scripted failures for the
//! degraded paths.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ipsync_core::config::{ManagedRecord, SyncConfig, Verbosity};
use ipsync_core::error::{Error, Result};
use ipsync_core::events::{LoggedEvent, SyncEvent};
use ipsync_core::traits::{
    ConfigStore, DnsProvider, IpSource, IpStateStore, RecordRef, RecordUpdate, ZoneRef,
};

/// A scriptable DnsProvider that records every call
///
/// Clones share state, so tests keep one clone and hand another to the
/// engine.
#[derive(Clone, Default)]
pub struct MockProvider {
    zones: Arc<Mutex<HashMap<String, Vec<ZoneRef>>>>,
    records: Arc<Mutex<HashMap<String, Vec<RecordRef>>>>,
    failing_updates: Arc<Mutex<HashSet<String>>>,

    pub zone_lookups: Arc<Mutex<Vec<String>>>,
    pub record_lookups: Arc<Mutex<Vec<(String, String)>>>,
    /// (record name, content, token) per update call
    pub updates: Arc<Mutex<Vec<(String, String, String)>>>,
    update_count: Arc<AtomicUsize>,

    update_delay: Arc<Mutex<Option<Duration>>>,
    in_flight_updates: Arc<AtomicUsize>,
    max_in_flight_updates: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a zone lookup result (may hold several matches)
    pub fn with_zone(self, zone_name: &str, ids: &[&str]) -> Self {
        let refs = ids
            .iter()
            .map(|id| ZoneRef {
                id: id.to_string(),
                name: zone_name.to_string(),
            })
            .collect();
        self.zones.lock().unwrap().insert(zone_name.to_string(), refs);
        self
    }

    /// Script a record lookup result
    pub fn with_record(self, record_name: &str, ids: &[&str]) -> Self {
        let refs = ids
            .iter()
            .map(|id| RecordRef {
                id: id.to_string(),
                name: record_name.to_string(),
            })
            .collect();
        self.records
            .lock()
            .unwrap()
            .insert(record_name.to_string(), refs);
        self
    }

    /// Make every update call sleep before returning
    pub fn with_update_delay(self, delay: Duration) -> Self {
        *self.update_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Make updates for the named record fail
    pub fn failing_update(self, record_name: &str) -> Self {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(record_name.to_string());
        self
    }

    pub fn zone_lookup_count(&self) -> usize {
        self.zone_lookups.lock().unwrap().len()
    }

    pub fn record_lookup_count(&self) -> usize {
        self.record_lookups.lock().unwrap().len()
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    /// Handle onto the shared update counter, for ordering probes
    pub fn update_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.update_count)
    }

    pub fn updated_records(&self) -> Vec<(String, String, String)> {
        self.updates.lock().unwrap().clone()
    }

    /// Highest number of update calls ever simultaneously in flight
    pub fn max_in_flight_updates(&self) -> usize {
        self.max_in_flight_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    async fn lookup_zone(&self, zone_name: &str, _token: &str) -> Result<Vec<ZoneRef>> {
        self.zone_lookups
            .lock()
            .unwrap()
            .push(zone_name.to_string());
        Ok(self
            .zones
            .lock()
            .unwrap()
            .get(zone_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn lookup_record(
        &self,
        zone_identifier: &str,
        record_name: &str,
        _token: &str,
    ) -> Result<Vec<RecordRef>> {
        self.record_lookups
            .lock()
            .unwrap()
            .push((zone_identifier.to_string(), record_name.to_string()));
        if zone_identifier.is_empty() {
            // A record lookup scoped to no zone is a degenerate call the
            // real provider rejects.
            return Err(Error::rejected(400, "invalid zone identifier"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(record_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_record(
        &self,
        _zone_identifier: &str,
        _record_identifier: &str,
        update: &RecordUpdate,
        token: &str,
    ) -> Result<()> {
        let in_flight = self.in_flight_updates.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_updates
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.update_count.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().unwrap().push((
            update.name.clone(),
            update.content.clone(),
            token.to_string(),
        ));
        self.in_flight_updates.fetch_sub(1, Ordering::SeqCst);

        if self.failing_updates.lock().unwrap().contains(&update.name) {
            return Err(Error::rejected(500, "scripted failure"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A scriptable IpSource
pub struct MockIpSource {
    responses: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
}

impl MockIpSource {
    /// Always return the same address
    pub fn always(ip: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(ip.to_string()),
        }
    }

    /// Always fail with a network error
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
        }
    }

    /// Return the scripted results in order, then fall back to the last
    /// successful one
    pub fn sequence(ips: &[&str]) -> Self {
        Self {
            responses: Mutex::new(ips.iter().map(|ip| Ok(ip.to_string())).collect()),
            fallback: ips.last().map(|ip| ip.to_string()),
        }
    }
}

#[async_trait]
impl IpSource for MockIpSource {
    async fn fetch(&self) -> Result<String> {
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(ip) => Ok(ip.clone()),
            None => Err(Error::network("scripted timeout")),
        }
    }
}

/// A ConfigStore that counts saves and keeps every saved document
#[derive(Clone, Default)]
pub struct CountingConfigStore {
    pub saved: Arc<Mutex<Vec<SyncConfig>>>,
}

impl CountingConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<SyncConfig> {
        self.saved.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ConfigStore for CountingConfigStore {
    async fn load(&self) -> Result<SyncConfig> {
        self.saved
            .lock()
            .unwrap()
            .last()
            .cloned()
            .ok_or_else(|| Error::storage("nothing saved"))
    }

    async fn save(&self, config: &SyncConfig) -> Result<()> {
        self.saved.lock().unwrap().push(config.clone());
        Ok(())
    }
}

/// An IpStateStore that records, for every save, how many provider update
/// calls had happened at that point (to assert state-before-update
/// ordering)
#[derive(Clone)]
pub struct CountingIpStateStore {
    ip: Arc<Mutex<Option<String>>>,
    /// (saved ip, provider update count at save time)
    pub saves: Arc<Mutex<Vec<(String, usize)>>>,
    update_probe: Arc<AtomicUsize>,
}

impl CountingIpStateStore {
    pub fn new(initial: Option<&str>, update_probe: Arc<AtomicUsize>) -> Self {
        Self {
            ip: Arc::new(Mutex::new(initial.map(str::to_string))),
            saves: Arc::new(Mutex::new(Vec::new())),
            update_probe,
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn current(&self) -> Option<String> {
        self.ip.lock().unwrap().clone()
    }
}

#[async_trait]
impl IpStateStore for CountingIpStateStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.ip.lock().unwrap().clone())
    }

    async fn save(&self, ip: &str) -> Result<()> {
        *self.ip.lock().unwrap() = Some(ip.to_string());
        self.saves
            .lock()
            .unwrap()
            .push((ip.to_string(), self.update_probe.load(Ordering::SeqCst)));
        Ok(())
    }
}

/// An unresolved record named `<host>.<zone>`
pub fn unresolved_record(zone: &str, host: &str) -> ManagedRecord {
    ManagedRecord::new(zone, format!("{host}.{zone}"))
}

/// A record with both provider identifiers already known
pub fn resolved_record(zone: &str, host: &str, zone_id: &str, record_id: &str) -> ManagedRecord {
    ManagedRecord::new(zone, format!("{host}.{zone}")).with_identifiers(zone_id, record_id)
}

/// A minimal configuration: default token, polling disabled
pub fn config_with(records: Vec<ManagedRecord>) -> SyncConfig {
    SyncConfig {
        auth_token: Some("test-token".to_string()),
        poll_interval_ms: 0,
        verbosity: Verbosity::Normal,
        records,
    }
}

/// Drain everything currently buffered on the event channel
pub fn drain_events(rx: &mut tokio::sync::mpsc::Receiver<LoggedEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(logged) = rx.try_recv() {
        events.push(logged.event);
    }
    events
}

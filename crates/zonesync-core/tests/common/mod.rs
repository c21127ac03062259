//! Test doubles and common utilities for reconciler contract tests
//!
//! The mock store keeps zones in memory, counts every call, and can be told
//! to fail specific operations so zone isolation can be observed.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use zonesync_core::error::{Error, Result};
use zonesync_core::model::{Record, RecordFields, RecordType, RecordUpdate, ZoneSoa};
use zonesync_core::traits::{RecordStore, SerialQuery};
use zonesync_core::{Changes, Endpoint, ReconcilerConfig};

/// Per-operation call counters
#[derive(Default)]
pub struct Calls {
    pub list_zones: AtomicUsize,
    pub list_record_ids: AtomicUsize,
    pub get_record: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub get_soa: AtomicUsize,
    pub refresh: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [
            &self.list_zones,
            &self.list_record_ids,
            &self.get_record,
            &self.create,
            &self.update,
            &self.delete,
            &self.get_soa,
            &self.refresh,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[derive(Default)]
struct ZoneState {
    records: BTreeMap<u64, Record>,
    serial: u32,
}

/// In-memory record store
pub struct MockRecordStore {
    zones: Mutex<BTreeMap<String, ZoneState>>,
    next_id: AtomicU64,
    pub calls: Calls,
    failing_targets: Mutex<HashSet<String>>,
    failing_get_zones: Mutex<HashSet<String>>,
    refreshed: Mutex<Vec<String>>,
    call_instants: Mutex<Vec<Instant>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            zones: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1000),
            calls: Calls::default(),
            failing_targets: Mutex::new(HashSet::new()),
            failing_get_zones: Mutex::new(HashSet::new()),
            refreshed: Mutex::new(Vec::new()),
            call_instants: Mutex::new(Vec::new()),
        }
    }

    /// Add a zone holding `records`, at serial 1
    pub fn with_zone(self, zone: &str, records: Vec<Record>) -> Self {
        {
            let mut zones = self.zones.lock().unwrap();
            let state = zones.entry(zone.to_string()).or_default();
            state.serial = 1;
            for record in records {
                state.records.insert(record.id, record);
            }
        }
        self
    }

    /// Any create/update/delete whose target equals `target` fails
    pub fn fail_target(&self, target: &str) {
        self.failing_targets.lock().unwrap().insert(target.to_string());
    }

    /// Every get_record in `zone` fails
    pub fn fail_gets_in(&self, zone: &str) {
        self.failing_get_zones.lock().unwrap().insert(zone.to_string());
    }

    /// Records of `zone`, ordered by id
    pub fn records(&self, zone: &str) -> Vec<Record> {
        self.zones
            .lock()
            .unwrap()
            .get(zone)
            .map(|z| z.records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn serial(&self, zone: &str) -> u32 {
        self.zones.lock().unwrap().get(zone).map(|z| z.serial).unwrap_or(0)
    }

    /// Simulate an out-of-band edit of the zone
    pub fn bump_serial(&self, zone: &str) {
        if let Some(z) = self.zones.lock().unwrap().get_mut(zone) {
            z.serial += 1;
        }
    }

    pub fn refreshed_zones(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }

    /// Instant of every store call, in call order
    pub fn call_instants(&self) -> Vec<Instant> {
        self.call_instants.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn track(&self, counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.call_instants.lock().unwrap().push(Instant::now());
    }

    fn check_target(&self, target: &str) -> Result<()> {
        if self.failing_targets.lock().unwrap().contains(target) {
            return Err(Error::store(format!("rejected target {target}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn list_zones(&self) -> Result<Vec<String>> {
        self.track(&self.calls.list_zones);
        Ok(self.zones.lock().unwrap().keys().cloned().collect())
    }

    async fn list_record_ids(&self, zone: &str) -> Result<Vec<u64>> {
        self.track(&self.calls.list_record_ids);
        let zones = self.zones.lock().unwrap();
        let state = zones
            .get(zone)
            .ok_or_else(|| Error::store(format!("unknown zone {zone}")))?;
        Ok(state.records.keys().copied().collect())
    }

    async fn get_record(&self, zone: &str, id: u64) -> Result<Record> {
        self.track(&self.calls.get_record);
        if self.failing_get_zones.lock().unwrap().contains(zone) {
            return Err(Error::store(format!("get {id} in {zone} failed")));
        }
        let zones = self.zones.lock().unwrap();
        zones
            .get(zone)
            .and_then(|z| z.records.get(&id))
            .cloned()
            .ok_or_else(|| Error::store(format!("record {id} not found")))
    }

    async fn create_record(&self, zone: &str, fields: &RecordFields) -> Result<()> {
        self.track(&self.calls.create);
        self.check_target(&fields.update.target)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = Record::new(
            zone,
            fields.update.sub_domain.clone(),
            fields.field_type.clone(),
            fields.update.target.clone(),
            fields.update.ttl,
        )
        .with_id(id);
        let mut zones = self.zones.lock().unwrap();
        let state = zones
            .get_mut(zone)
            .ok_or_else(|| Error::store(format!("unknown zone {zone}")))?;
        state.records.insert(id, record);
        Ok(())
    }

    async fn update_record(&self, zone: &str, id: u64, update: &RecordUpdate) -> Result<()> {
        self.track(&self.calls.update);
        self.check_target(&update.target)?;
        let mut zones = self.zones.lock().unwrap();
        let record = zones
            .get_mut(zone)
            .and_then(|z| z.records.get_mut(&id))
            .ok_or_else(|| Error::store(format!("record {id} not found")))?;
        record.sub_domain = update.sub_domain.clone();
        record.target = update.target.clone();
        record.ttl = update.ttl;
        Ok(())
    }

    async fn delete_record(&self, zone: &str, id: u64) -> Result<()> {
        self.track(&self.calls.delete);
        let mut zones = self.zones.lock().unwrap();
        let state = zones
            .get_mut(zone)
            .ok_or_else(|| Error::store(format!("unknown zone {zone}")))?;
        let target = state
            .records
            .get(&id)
            .map(|r| r.target.clone())
            .ok_or_else(|| Error::store(format!("record {id} not found")))?;
        self.check_target(&target)?;
        state.records.remove(&id);
        Ok(())
    }

    async fn get_soa(&self, zone: &str) -> Result<ZoneSoa> {
        self.track(&self.calls.get_soa);
        Ok(ZoneSoa {
            server: format!("ns1.{zone}."),
            serial: self.serial(zone),
        })
    }

    async fn refresh_zone(&self, zone: &str) -> Result<()> {
        self.track(&self.calls.refresh);
        self.refreshed.lock().unwrap().push(zone.to_string());
        if let Some(z) = self.zones.lock().unwrap().get_mut(zone) {
            z.serial += 1;
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Serial query answering from the mock store's live serial
pub struct StoreSerialQuery {
    store: Arc<MockRecordStore>,
    pub calls: AtomicUsize,
}

impl StoreSerialQuery {
    pub fn new(store: Arc<MockRecordStore>) -> Self {
        Self {
            store,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SerialQuery for StoreSerialQuery {
    async fn query_serial(&self, zone: &str, _server: &str) -> Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.serial(zone))
    }
}

/// Serial query with a scripted answer; `None` answers with an error
pub struct ScriptedSerialQuery {
    answer: Mutex<Option<u32>>,
    pub calls: AtomicUsize,
}

impl ScriptedSerialQuery {
    pub fn answering(serial: u32) -> Self {
        Self {
            answer: Mutex::new(Some(serial)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, answer: Option<u32>) {
        *self.answer.lock().unwrap() = answer;
    }
}

#[async_trait::async_trait]
impl SerialQuery for ScriptedSerialQuery {
    async fn query_serial(&self, _zone: &str, _server: &str) -> Result<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .unwrap()
            .ok_or_else(|| Error::authoritative("no answer"))
    }
}

pub fn a_record(zone: &str, sub: &str, target: &str, id: u64) -> Record {
    Record::new(zone, sub, RecordType::A, target, 60).with_id(id)
}

pub fn a_endpoint(name: &str, targets: &[&str]) -> Endpoint {
    Endpoint::new(name, RecordType::A, targets.iter().copied())
}

pub fn creates(endpoints: Vec<Endpoint>) -> Changes {
    Changes {
        create: endpoints,
        ..Changes::default()
    }
}

/// Default configuration with a rate limit high enough to be invisible
pub fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        api_rate_limit: 10_000,
        ..ReconcilerConfig::default()
    }
}

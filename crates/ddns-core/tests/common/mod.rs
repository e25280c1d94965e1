//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles keep their state behind `Arc`s so a test can hand a clone to
//! the `Reconciler` and still inspect call counts and provider-side records
//! afterwards.

#![allow(dead_code)]

use ddns_core::address::{validate_ipv4, validate_ipv6};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, RecordPayload, RecordState, StateStore};
use ddns_core::{DesiredState, MemoryStateStore, Reconciler, RecordType};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A record as the mock provider holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    pub id: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: Option<bool>,
}

#[derive(Debug, Default)]
struct ProviderWorld {
    token_active: bool,
    /// zone name → zone id
    zones: HashMap<String, String>,
    /// zone ids that verify
    valid_zone_ids: HashSet<String>,
    /// zone the builder helpers act on
    zone_id: String,
    records: HashMap<(String, RecordType, String), ProviderRecord>,
    /// zone id passed to each record lookup or write, in call order
    record_zone_ids: Vec<String>,
    next_id: usize,
    /// every update attempt fails while set
    reject_updates: bool,
}

#[derive(Debug, Default)]
struct ProviderCounters {
    verify_token: AtomicUsize,
    verify_zone: AtomicUsize,
    find_zone: AtomicUsize,
    find_record: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
}

/// An in-memory DnsProvider that tracks calls
#[derive(Debug, Clone)]
pub struct MockDnsProvider {
    world: Arc<Mutex<ProviderWorld>>,
    counters: Arc<ProviderCounters>,
}

impl MockDnsProvider {
    /// A provider with an active token and one zone
    pub fn new(zone_name: &str, zone_id: &str) -> Self {
        let mut world = ProviderWorld {
            token_active: true,
            ..Default::default()
        };
        world.zones.insert(zone_name.to_string(), zone_id.to_string());
        world.valid_zone_ids.insert(zone_id.to_string());
        world.zone_id = zone_id.to_string();

        Self {
            world: Arc::new(Mutex::new(world)),
            counters: Arc::new(ProviderCounters::default()),
        }
    }

    pub fn with_inactive_token(self) -> Self {
        self.world.lock().unwrap().token_active = false;
        self
    }

    /// Add an existing record on the provider side
    pub fn with_record(self, record_type: RecordType, name: &str, id: &str, content: &str) -> Self {
        let mut world = self.world.lock().unwrap();
        let key = (world.zone_id.clone(), record_type, name.to_string());
        world.records.insert(
            key,
            ProviderRecord {
                id: id.to_string(),
                content: content.to_string(),
                ttl: 300,
                proxied: None,
            },
        );
        drop(world);
        self
    }

    /// Make every update attempt fail
    pub fn rejecting_updates(self) -> Self {
        self.world.lock().unwrap().reject_updates = true;
        self
    }

    /// Remove a record behind the engine's back
    pub fn delete_record(&self, record_type: RecordType, name: &str) {
        let mut world = self.world.lock().unwrap();
        let key = (world.zone_id.clone(), record_type, name.to_string());
        world.records.remove(&key);
    }

    pub fn record(&self, record_type: RecordType, name: &str) -> Option<ProviderRecord> {
        let world = self.world.lock().unwrap();
        world
            .records
            .get(&(world.zone_id.clone(), record_type, name.to_string()))
            .cloned()
    }

    /// Zone ids used by record lookups and writes so far
    pub fn record_zone_ids(&self) -> Vec<String> {
        self.world.lock().unwrap().record_zone_ids.clone()
    }

    pub fn verify_token_calls(&self) -> usize {
        self.counters.verify_token.load(Ordering::SeqCst)
    }

    pub fn verify_zone_calls(&self) -> usize {
        self.counters.verify_zone.load(Ordering::SeqCst)
    }

    pub fn find_zone_calls(&self) -> usize {
        self.counters.find_zone.load(Ordering::SeqCst)
    }

    pub fn find_record_calls(&self) -> usize {
        self.counters.find_record.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.counters.create.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.counters.update.load(Ordering::SeqCst)
    }

    /// Create plus update attempts
    pub fn mutating_calls(&self) -> usize {
        self.create_calls() + self.update_calls()
    }
}

impl ProviderWorld {
    /// Note the zone a record call targets; unknown zones are refused
    fn enter_zone(&mut self, zone_id: &str) -> Result<()> {
        self.record_zone_ids.push(zone_id.to_string());
        if self.valid_zone_ids.contains(zone_id) {
            Ok(())
        } else {
            Err(Error::provider("mock", format!("zone {zone_id} does not exist")))
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn verify_token(&self) -> Result<()> {
        self.counters.verify_token.fetch_add(1, Ordering::SeqCst);
        if self.world.lock().unwrap().token_active {
            Ok(())
        } else {
            Err(Error::auth("token is not active"))
        }
    }

    async fn verify_zone(&self, zone_id: &str) -> Result<bool> {
        self.counters.verify_zone.fetch_add(1, Ordering::SeqCst);
        Ok(self.world.lock().unwrap().valid_zone_ids.contains(zone_id))
    }

    async fn find_zone(&self, zone_name: &str) -> Result<String> {
        self.counters.find_zone.fetch_add(1, Ordering::SeqCst);
        self.world
            .lock()
            .unwrap()
            .zones
            .get(zone_name)
            .cloned()
            .ok_or_else(|| Error::zone_not_found(zone_name))
    }

    async fn find_record(
        &self,
        zone_id: &str,
        record_type: RecordType,
        record_name: &str,
    ) -> Result<Option<String>> {
        self.counters.find_record.fetch_add(1, Ordering::SeqCst);
        let mut world = self.world.lock().unwrap();
        world.enter_zone(zone_id)?;
        Ok(world
            .records
            .get(&(zone_id.to_string(), record_type, record_name.to_string()))
            .map(|record| record.id.clone()))
    }

    async fn create_record(&self, zone_id: &str, payload: &RecordPayload) -> Result<String> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        let mut world = self.world.lock().unwrap();
        world.enter_zone(zone_id)?;
        world.next_id += 1;
        let id = format!("rec-{}", world.next_id);
        world.records.insert(
            (zone_id.to_string(), payload.record_type, payload.name.clone()),
            ProviderRecord {
                id: id.clone(),
                content: payload.content.clone(),
                ttl: payload.ttl,
                proxied: payload.proxied,
            },
        );
        Ok(id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<()> {
        self.counters.update.fetch_add(1, Ordering::SeqCst);
        let mut world = self.world.lock().unwrap();
        world.enter_zone(zone_id)?;
        if world.reject_updates {
            return Err(Error::apply("update rejected"));
        }

        let record = world
            .records
            .get_mut(&(zone_id.to_string(), payload.record_type, payload.name.clone()))
            .filter(|record| record.id == record_id)
            .ok_or_else(|| Error::apply(format!("record {record_id} does not exist")))?;

        record.content = payload.content.clone();
        record.ttl = payload.ttl;
        if payload.proxied.is_some() {
            record.proxied = payload.proxied;
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpSource returning fixed raw answers, validated like the real one
#[derive(Debug, Clone)]
pub struct MockIpSource {
    v4: Arc<Mutex<Option<String>>>,
    v6: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockIpSource {
    /// `None` answers behave like an unreachable service
    pub fn new(v4: Option<&str>, v6: Option<&str>) -> Self {
        Self {
            v4: Arc::new(Mutex::new(v4.map(str::to_string))),
            v6: Arc::new(Mutex::new(v6.map(str::to_string))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_v4(&self, raw: &str) {
        *self.v4.lock().unwrap() = Some(raw.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for MockIpSource {
    async fn resolve_v4(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let raw = self.v4.lock().unwrap().clone();
        match raw {
            Some(raw) => validate_ipv4(&raw),
            None => Err(Error::network("IPv4 service unreachable")),
        }
    }

    async fn resolve_v6(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let raw = self.v6.lock().unwrap().clone();
        match raw {
            Some(raw) => validate_ipv6(&raw),
            None => Err(Error::network("IPv6 service unreachable")),
        }
    }
}

/// A MemoryStateStore that counts record writes
#[derive(Debug, Clone, Default)]
pub struct CountingStateStore {
    inner: MemoryStateStore,
    record_writes: Arc<AtomicUsize>,
}

impl CountingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_writes(&self) -> usize {
        self.record_writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for CountingStateStore {
    async fn get_record(
        &self,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<RecordState>> {
        self.inner.get_record(record_name, record_type).await
    }

    async fn set_record(
        &self,
        record_name: &str,
        record_type: RecordType,
        state: &RecordState,
    ) -> Result<()> {
        self.record_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_record(record_name, record_type, state).await
    }

    async fn delete_record(&self, record_name: &str, record_type: RecordType) -> Result<()> {
        self.record_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_record(record_name, record_type).await
    }

    async fn get_zone_id(&self, zone_name: &str) -> Result<Option<String>> {
        self.inner.get_zone_id(zone_name).await
    }

    async fn set_zone_id(&self, zone_name: &str, zone_id: &str) -> Result<()> {
        self.inner.set_zone_id(zone_name, zone_id).await
    }

    async fn delete_zone_id(&self, zone_name: &str) -> Result<()> {
        self.inner.delete_zone_id(zone_name).await
    }
}

pub const ZONE: &str = "example.com";
pub const ZONE_ID: &str = "zone-123";
pub const RECORD: &str = "home.example.com";

/// Desired state for `home.example.com`, A only
pub fn desired() -> DesiredState {
    DesiredState::new("test-token-value", ZONE).with_subdomain("home")
}

/// Build a reconciler over shared doubles
pub fn reconciler(
    provider: &MockDnsProvider,
    ip_source: &MockIpSource,
    store: &MemoryStateStore,
    desired: DesiredState,
) -> Reconciler {
    Reconciler::new(
        Box::new(provider.clone()),
        Box::new(ip_source.clone()),
        Box::new(store.clone()),
        desired,
    )
    .expect("desired state is valid")
}

/// Read the cached record id for a type
pub async fn cached_record_id(store: &dyn StateStore, record_type: RecordType) -> Option<String> {
    store
        .get_record(RECORD, record_type)
        .await
        .unwrap()
        .and_then(|state| state.record_id)
}

//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles keep their state behind `Arc`s so a test can hand a clone to
//! a reconciler and inspect its own handle afterwards.

#![allow(dead_code)]

use chrono::{TimeDelta, Utc};
use converge_core::codec::{soa_record_set, FlatRecordSet, RecordType, Soa};
use converge_core::error::{Error, Result};
use converge_core::traits::{
    ChangeRecord, ChangeStatus, ClusterProvider, DeleteStatus, ResourceKind, ZoneProvider,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One submitted change batch
#[derive(Debug, Clone)]
pub struct SubmittedBatch {
    pub zone: String,
    pub additions: Vec<FlatRecordSet>,
    pub deletions: Vec<FlatRecordSet>,
}

#[derive(Debug, Default)]
struct Zone {
    dns_name: String,
    record_sets: Vec<FlatRecordSet>,
}

/// An in-memory zone provider that applies change batches like the real API
///
/// Deleting a record set that does not match a listed one exactly fails the
/// whole batch, as does adding a set whose name and type already exist.
#[derive(Clone, Default)]
pub struct MockZoneProvider {
    zones: Arc<Mutex<HashMap<String, Zone>>>,
    batches: Arc<Mutex<Vec<SubmittedBatch>>>,
    create_call_count: Arc<AtomicUsize>,
    delete_call_count: Arc<AtomicUsize>,
    status: Arc<Mutex<Option<String>>>,
    changes: Arc<Mutex<Vec<ChangeRecord>>>,
}

impl MockZoneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone holding `record_sets`
    pub fn with_zone(self, name: &str, dns_name: &str, record_sets: Vec<FlatRecordSet>) -> Self {
        self.zones.lock().unwrap().insert(
            name.to_string(),
            Zone {
                dns_name: dns_name.to_string(),
                record_sets,
            },
        );
        self
    }

    /// Report batches as still running with this status string
    pub fn with_status(self, status: &str) -> Self {
        *self.status.lock().unwrap() = Some(status.to_string());
        self
    }

    pub fn record_sets(&self, zone: &str) -> Vec<FlatRecordSet> {
        self.zones
            .lock()
            .unwrap()
            .get(zone)
            .map(|zone| zone.record_sets.clone())
            .unwrap_or_default()
    }

    pub fn has_zone(&self, zone: &str) -> bool {
        self.zones.lock().unwrap().contains_key(zone)
    }

    pub fn batches(&self) -> Vec<SubmittedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }
}

/// Default SOA a provider seeds new zones with
pub fn default_soa() -> Soa {
    Soa {
        primary: "ns-cloud-a1.googledomains.com.".to_string(),
        contact: "cloud-dns-hostmaster.google.com.".to_string(),
        serial: 1,
        refresh: 21600,
        retry: 3600,
        expiration: 259200,
        maxcache: 300,
    }
}

#[async_trait::async_trait]
impl ZoneProvider for MockZoneProvider {
    async fn list_zones(&self, _project: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.zones.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_zone(
        &self,
        name: &str,
        dns_name: &str,
        _description: Option<&str>,
        _project: &str,
    ) -> Result<()> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        let defaults = vec![
            soa_record_set(dns_name, &default_soa()).with_ttl(21600),
            FlatRecordSet::new(
                dns_name,
                RecordType::Ns,
                vec![
                    "ns-cloud-a1.googledomains.com.".to_string(),
                    "ns-cloud-a2.googledomains.com.".to_string(),
                ],
            )
            .with_ttl(21600),
        ];
        self.zones.lock().unwrap().insert(
            name.to_string(),
            Zone {
                dns_name: dns_name.to_string(),
                record_sets: defaults,
            },
        );
        Ok(())
    }

    async fn delete_zone(&self, name: &str, _project: &str) -> Result<bool> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.lock().unwrap().remove(name).is_some())
    }

    async fn list_resource_record_sets(
        &self,
        zone: &str,
        _project: &str,
    ) -> Result<Vec<FlatRecordSet>> {
        self.zones
            .lock()
            .unwrap()
            .get(zone)
            .map(|zone| zone.record_sets.clone())
            .ok_or_else(|| Error::ZoneNotFound(zone.to_string()))
    }

    async fn submit_change_batch(
        &self,
        zone: &str,
        _project: &str,
        additions: &[FlatRecordSet],
        deletions: &[FlatRecordSet],
    ) -> Result<ChangeStatus> {
        self.batches.lock().unwrap().push(SubmittedBatch {
            zone: zone.to_string(),
            additions: additions.to_vec(),
            deletions: deletions.to_vec(),
        });

        let mut zones = self.zones.lock().unwrap();
        let state = zones
            .get_mut(zone)
            .ok_or_else(|| Error::ZoneNotFound(zone.to_string()))?;

        let mut sets = state.record_sets.clone();
        for deletion in deletions {
            let Some(index) = sets.iter().position(|set| set == deletion) else {
                return Err(Error::provider(
                    "mock",
                    format!("deletion does not match a listed set: {:?}", deletion),
                ));
            };
            sets.remove(index);
        }
        for addition in additions {
            if sets
                .iter()
                .any(|set| set.name == addition.name && set.record_type == addition.record_type)
            {
                return Err(Error::provider(
                    "mock",
                    format!("record set already exists: {} {}", addition.record_type, addition.name),
                ));
            }
            sets.push(addition.clone());
        }
        state.record_sets = sets;

        let status = match self.status.lock().unwrap().as_deref() {
            Some(status) => ChangeStatus::from_status(status),
            None => ChangeStatus::Done,
        };
        // Batches of one test run within the same second; keep them ordered
        let offset = self.changes.lock().unwrap().len() as i64;
        let started = Utc::now() + TimeDelta::try_seconds(offset).unwrap();
        self.changes.lock().unwrap().push(ChangeRecord {
            started,
            status: status.clone(),
        });
        Ok(status)
    }

    async fn list_changes(&self, _zone: &str, _project: &str) -> Result<Vec<ChangeRecord>> {
        Ok(self.changes.lock().unwrap().clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// How a mock cluster answers delete requests
#[derive(Debug, Clone)]
pub enum DeleteBehavior {
    /// Remove at once
    Immediate,
    /// Answer "pending" and keep the object for this many `show` calls
    Lingering(usize),
    /// Answer "pending" and never remove the object
    Stuck,
    /// Refuse the deletion
    Refuse,
}

type ObjectKey = (ResourceKind, String, String);

/// An in-memory cluster with call counters
#[derive(Clone)]
pub struct MockClusterProvider {
    objects: Arc<Mutex<HashMap<ObjectKey, Value>>>,
    lingering: Arc<Mutex<HashMap<ObjectKey, usize>>>,
    delete_behavior: DeleteBehavior,
    show_call_count: Arc<AtomicUsize>,
    create_call_count: Arc<AtomicUsize>,
    replace_call_count: Arc<AtomicUsize>,
    patch_calls: Arc<Mutex<Vec<Value>>>,
    delete_call_count: Arc<AtomicUsize>,
}

impl MockClusterProvider {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            lingering: Arc::new(Mutex::new(HashMap::new())),
            delete_behavior: DeleteBehavior::Immediate,
            show_call_count: Arc::new(AtomicUsize::new(0)),
            create_call_count: Arc::new(AtomicUsize::new(0)),
            replace_call_count: Arc::new(AtomicUsize::new(0)),
            patch_calls: Arc::new(Mutex::new(Vec::new())),
            delete_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_object(self, kind: ResourceKind, namespace: &str, name: &str, body: Value) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(key(kind, name, namespace), body);
        self
    }

    pub fn with_delete_behavior(mut self, behavior: DeleteBehavior) -> Self {
        self.delete_behavior = behavior;
        self
    }

    pub fn object(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<Value> {
        self.objects
            .lock()
            .unwrap()
            .get(&key(kind, name, namespace))
            .cloned()
    }

    pub fn show_call_count(&self) -> usize {
        self.show_call_count.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn replace_call_count(&self) -> usize {
        self.replace_call_count.load(Ordering::SeqCst)
    }

    pub fn patch_calls(&self) -> Vec<Value> {
        self.patch_calls.lock().unwrap().clone()
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }

    /// Number of calls that change the cluster
    pub fn mutation_count(&self) -> usize {
        self.create_call_count()
            + self.replace_call_count()
            + self.patch_calls().len()
            + self.delete_call_count()
    }
}

fn key(kind: ResourceKind, name: &str, namespace: &str) -> ObjectKey {
    let namespace = if kind.is_namespaced() { namespace } else { "" };
    (kind, namespace.to_string(), name.to_string())
}

/// Recursively merge `patch` into `target`
fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (k, v) in patch {
                merge(target.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait::async_trait]
impl ClusterProvider for MockClusterProvider {
    async fn show(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<Option<Value>> {
        self.show_call_count.fetch_add(1, Ordering::SeqCst);
        let key = key(kind, name, namespace);

        let mut lingering = self.lingering.lock().unwrap();
        if let Some(remaining) = lingering.get_mut(&key) {
            if *remaining == 0 {
                lingering.remove(&key);
                self.objects.lock().unwrap().remove(&key);
            } else {
                *remaining -= 1;
            }
        }

        Ok(self.objects.lock().unwrap().get(&key).cloned())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert(key(kind, name, namespace), body.clone());
        Ok(body.clone())
    }

    async fn replace(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value> {
        self.replace_call_count.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let key = key(kind, name, namespace);
        if !objects.contains_key(&key) {
            return Err(Error::ObjectNotFound(name.to_string()));
        }
        objects.insert(key, body.clone());
        Ok(body.clone())
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value> {
        self.patch_calls.lock().unwrap().push(body.clone());
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(&key(kind, name, namespace))
            .ok_or_else(|| Error::ObjectNotFound(name.to_string()))?;
        merge(object, body);
        Ok(object.clone())
    }

    async fn delete(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<DeleteStatus> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        let key = key(kind, name, namespace);

        Ok(match &self.delete_behavior {
            DeleteBehavior::Immediate => {
                self.objects.lock().unwrap().remove(&key);
                DeleteStatus::Deleted
            }
            DeleteBehavior::Lingering(shows) => {
                self.lingering.lock().unwrap().insert(key, *shows);
                DeleteStatus::Pending("Terminating".to_string())
            }
            DeleteBehavior::Stuck => DeleteStatus::Pending("Terminating".to_string()),
            DeleteBehavior::Refuse => DeleteStatus::Failed("403 Forbidden".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

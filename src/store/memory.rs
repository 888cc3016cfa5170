//! In-process storage backends.
//!
//! Both stores count their writes and can be switched offline, which lets
//! callers observe exactly which side effects an operation had. The record
//! store can also reject a single write.

use super::{HashStore, LogStore, RecordFilter, RecordStore, StoreError};
use crate::record::{SecurityLogEntry, SignalRecord, SubjectType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// Availability switch and write counter shared by the memory backends.
#[derive(Debug)]
struct Health {
    available: AtomicBool,
    fail_next_write: AtomicBool,
    writes: AtomicU64,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            available: AtomicBool::new(true),
            fail_next_write: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }
}

impl Health {
    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("backend offline".to_string()))
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

type RecordKey = (SubjectType, String);

/// Memory-backed record and log store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<RecordKey, SignalRecord>>,
    logs: RwLock<Vec<SecurityLogEntry>>,
    health: Health,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the store online or offline. Offline, every call fails.
    pub fn set_available(&self, available: bool) {
        self.health.available.store(available, Ordering::SeqCst);
    }

    /// Make the next write (upsert, delete or append) fail. Reads are
    /// unaffected.
    pub fn fail_next_write(&self) {
        self.health.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Number of writes (upserts, deletes, appends) performed so far.
    pub fn writes(&self) -> u64 {
        self.health.writes.load(Ordering::SeqCst)
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the security log.
    pub fn logs(&self) -> Vec<SecurityLogEntry> {
        self.logs.read().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(
        &self,
        subject_type: SubjectType,
        subject_value: &str,
    ) -> Result<Option<SignalRecord>, StoreError> {
        self.health.check()?;
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .get(&(subject_type, subject_value.to_string()))
            .cloned())
    }

    async fn upsert(&self, record: &SignalRecord) -> Result<(), StoreError> {
        self.health.check_write()?;
        let mut records = self.records.write().map_err(poisoned)?;
        let key = (record.subject_type, record.subject_value.clone());

        let mut stored = record.clone();
        if let Some(existing) = records.get(&key) {
            stored.created_at = existing.created_at;
        }
        records.insert(key, stored);
        self.health.wrote();
        Ok(())
    }

    async fn delete(
        &self,
        subject_type: SubjectType,
        subject_value: &str,
    ) -> Result<bool, StoreError> {
        self.health.check_write()?;
        let mut records = self.records.write().map_err(poisoned)?;
        let removed = records
            .remove(&(subject_type, subject_value.to_string()))
            .is_some();
        self.health.wrote();
        Ok(removed)
    }

    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<SignalRecord>, StoreError> {
        self.health.check()?;
        let records = self.records.read().map_err(poisoned)?;
        let mut found: Vec<SignalRecord> = records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.subject_value.cmp(&b.subject_value));
        Ok(found)
    }
}

#[async_trait]
impl LogStore for MemoryRecordStore {
    async fn append(&self, entry: &SecurityLogEntry) -> Result<(), StoreError> {
        self.health.check_write()?;
        self.logs.write().map_err(poisoned)?.push(entry.clone());
        self.health.wrote();
        Ok(())
    }
}

/// Memory-backed namespaced key-value store.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    namespaces: RwLock<HashMap<String, HashMap<String, String>>>,
    writes_by_namespace: RwLock<HashMap<String, u64>>,
    health: Health,
}

impl MemoryHashStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the store online or offline. Offline, every call fails.
    pub fn set_available(&self, available: bool) {
        self.health.available.store(available, Ordering::SeqCst);
    }

    /// Total number of write calls. A batch counts once.
    pub fn writes(&self) -> u64 {
        self.health.writes.load(Ordering::SeqCst)
    }

    /// Number of write calls against one namespace. A batch counts once.
    pub fn namespace_writes(&self, namespace: &str) -> u64 {
        self.writes_by_namespace
            .read()
            .ok()
            .and_then(|w| w.get(namespace).copied())
            .unwrap_or(0)
    }

    /// Number of fields in a namespace.
    pub fn namespace_len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .ok()
            .and_then(|n| n.get(namespace).map(|m| m.len()))
            .unwrap_or(0)
    }

    /// Drop every field of a namespace, as if the cache had been flushed.
    pub fn clear_namespace(&self, namespace: &str) {
        if let Ok(mut namespaces) = self.namespaces.write() {
            namespaces.remove(namespace);
        }
    }

    fn record_write(&self, namespace: &str) {
        self.health.wrote();
        if let Ok(mut writes) = self.writes_by_namespace.write() {
            *writes.entry(namespace.to_string()).or_insert(0) += 1;
        }
    }
}

#[async_trait]
impl HashStore for MemoryHashStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        self.health.check()?;
        let namespaces = self.namespaces.read().map_err(poisoned)?;
        Ok(namespaces.get(namespace).and_then(|n| n.get(key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), StoreError> {
        self.health.check()?;
        self.namespaces
            .write()
            .map_err(poisoned)?
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.record_write(namespace);
        Ok(())
    }

    async fn set_many(
        &self,
        namespace: &str,
        entries: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        self.health.check()?;
        self.namespaces
            .write()
            .map_err(poisoned)?
            .entry(namespace.to_string())
            .or_default()
            .extend(entries);
        self.record_write(namespace);
        Ok(())
    }
}

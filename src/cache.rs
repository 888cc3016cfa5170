//! Blacklist cache.
//!
//! Maps a blacklisted address to a JSON snapshot of its [`SignalRecord`] in
//! the `blacklist` namespace of the fast store. The record store is the source
//! of truth; this is a projection that can be empty after a restart (until
//! warm-up runs) and is never cleaned up when a subject is unsigned.

use crate::record::SignalRecord;
use crate::store::{HashStore, StoreError};
use std::sync::Arc;

/// Namespace holding blacklist snapshots.
pub const BLACKLIST_NAMESPACE: &str = "blacklist";

/// Fast lookup of blacklisted subjects.
#[derive(Clone)]
pub struct BlacklistCache {
    store: Arc<dyn HashStore>,
}

impl BlacklistCache {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self { store }
    }

    /// Publish (or overwrite) the snapshot of one record.
    pub async fn publish(&self, record: &SignalRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.store
            .set(BLACKLIST_NAMESPACE, &record.subject_value, value)
            .await
    }

    /// Publish several snapshots as a single batch.
    ///
    /// Nothing is written if serialization of any record fails.
    pub async fn publish_all(&self, records: &[SignalRecord]) -> Result<usize, StoreError> {
        let entries = records
            .iter()
            .map(|r| -> Result<(String, String), StoreError> {
                Ok((r.subject_value.clone(), serde_json::to_string(r)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = entries.len();
        self.store.set_many(BLACKLIST_NAMESPACE, entries).await?;
        Ok(count)
    }

    /// Snapshot cached for a subject value, if any.
    pub async fn lookup(&self, subject_value: &str) -> Result<Option<SignalRecord>, StoreError> {
        let Some(raw) = self.store.get(BLACKLIST_NAMESPACE, subject_value).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: subject_value.to_string(),
                reason: e.to_string(),
            })
    }

    /// Check if a subject value has a cache entry.
    pub async fn contains(&self, subject_value: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(BLACKLIST_NAMESPACE, subject_value)
            .await?
            .is_some())
    }
}

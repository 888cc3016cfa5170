//! Storage contracts.
//!
//! The agent needs two collaborators: a durable store holding one
//! [`SignalRecord`] per subject plus the security log, and a fast namespaced
//! key-value store (the blacklist cache and runtime parameters). Both are
//! reached through the async traits below; [`memory`] provides in-process
//! implementations.
//!
//! Record mutation is a plain read-then-write. Two concurrent signals against
//! the same subject may read the same strike count, and one of the strikes is
//! then lost. A backend that supports an atomic increment-and-compare can be
//! introduced behind [`RecordStore`] without changing the tracker's API.

pub mod memory;

use crate::record::{SecurityLogEntry, SignalRecord, SubjectType};
use async_trait::async_trait;
use thiserror::Error;

/// Error from a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be serialized for the cache.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be decoded.
    #[error("corrupt entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Filter for bulk record queries. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub subject_type: Option<SubjectType>,
    pub strike_status: Option<u32>,
}

impl RecordFilter {
    /// Match blacklisted records of one subject type.
    pub fn blacklisted(subject_type: SubjectType) -> Self {
        Self {
            subject_type: Some(subject_type),
            strike_status: Some(crate::record::BLACKLISTED),
        }
    }

    /// Check if a record passes this filter.
    pub fn matches(&self, record: &SignalRecord) -> bool {
        self.subject_type.map_or(true, |t| t == record.subject_type)
            && self.strike_status.map_or(true, |s| s == record.strike_status)
    }
}

/// Durable store of signal records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the record for a subject.
    async fn find(
        &self,
        subject_type: SubjectType,
        subject_value: &str,
    ) -> Result<Option<SignalRecord>, StoreError>;

    /// Insert or replace the record keyed by its subject.
    ///
    /// `created_at` of an existing record is preserved.
    async fn upsert(&self, record: &SignalRecord) -> Result<(), StoreError>;

    /// Delete the record for a subject. Returns whether a record existed.
    async fn delete(&self, subject_type: SubjectType, subject_value: &str)
        -> Result<bool, StoreError>;

    /// Find every record matching `filter`.
    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<SignalRecord>, StoreError>;
}

/// Durable, append-only security log.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &SecurityLogEntry) -> Result<(), StoreError>;
}

/// Fast namespaced key-value store (hash per namespace).
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Read one field.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Write one field.
    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), StoreError>;

    /// Write several fields in one batch.
    async fn set_many(
        &self,
        namespace: &str,
        entries: Vec<(String, String)>,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filter_matches() {
        let mut record = SignalRecord::first_signal(SubjectType::Address, "1.2.3.4", Utc::now());
        let filter = RecordFilter::blacklisted(SubjectType::Address);
        assert!(!filter.matches(&record));

        record.strike_status = 0;
        assert!(filter.matches(&record));

        record.subject_type = SubjectType::Account;
        assert!(!filter.matches(&record));
        assert!(RecordFilter::default().matches(&record));
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");

        let err = StoreError::Corrupt {
            key: "1.2.3.4".to_string(),
            reason: "bad json".to_string(),
        };
        assert_eq!(err.to_string(), "corrupt entry '1.2.3.4': bad json");
    }
}

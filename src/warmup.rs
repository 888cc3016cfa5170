//! Blacklist warm-up: rebuild the blacklist cache from the record store.

use crate::cache::BlacklistCache;
use crate::record::SubjectType;
use crate::store::{RecordFilter, RecordStore, StoreError};
use std::sync::Arc;
use tracing::info;

/// Republishes every blacklisted address into the cache.
#[derive(Clone)]
pub struct BlacklistWarmup {
    records: Arc<dyn RecordStore>,
    blacklist: BlacklistCache,
}

impl BlacklistWarmup {
    pub fn new(records: Arc<dyn RecordStore>, blacklist: BlacklistCache) -> Self {
        Self { records, blacklist }
    }

    /// Publish all blacklisted addresses in one batch.
    ///
    /// Returns the number of entries written. Safe to run repeatedly.
    pub async fn load_blacklist(&self) -> Result<usize, StoreError> {
        let blacklisted = self
            .records
            .find_many(&RecordFilter::blacklisted(SubjectType::Address))
            .await?;

        if blacklisted.is_empty() {
            info!("No blacklisted addresses to load");
            return Ok(0);
        }

        let count = self.blacklist.publish_all(&blacklisted).await?;
        info!(entries = count, "Blacklist cache loaded");
        Ok(count)
    }
}

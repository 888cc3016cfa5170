//! Security audit log.

use crate::params::ParamLookup;
use crate::record::SecurityLogEntry;
use crate::store::{LogStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

/// Writes security events to the log store when the `security_log` toggle
/// is enabled.
#[derive(Clone)]
pub struct AuditLogger {
    params: ParamLookup,
    logs: Arc<dyn LogStore>,
}

impl AuditLogger {
    pub fn new(params: ParamLookup, logs: Arc<dyn LogStore>) -> Self {
        Self { params, logs }
    }

    /// Write one entry. Returns whether it was written.
    ///
    /// A failed toggle read skips logging instead of failing the caller.
    pub async fn write_log(&self, tag: &str, content: &str) -> Result<bool, StoreError> {
        match self.params.logging_enabled().await {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => {
                warn!(error = %e, tag, "Could not read audit log toggle, skipping entry");
                return Ok(false);
            }
        }

        let entry = SecurityLogEntry::new(tag, content, Utc::now());
        self.logs.append(&entry).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{LOG_ENABLED, PARAM_NAMESPACE, SECURITY_LOG_KEY};
    use crate::store::memory::{MemoryHashStore, MemoryRecordStore};
    use crate::store::HashStore;

    async fn setup(
        toggle: Option<&str>,
    ) -> (AuditLogger, Arc<MemoryHashStore>, Arc<MemoryRecordStore>) {
        let fast = Arc::new(MemoryHashStore::new());
        if let Some(value) = toggle {
            fast.set(PARAM_NAMESPACE, SECURITY_LOG_KEY, value.to_string())
                .await
                .unwrap();
        }
        let store = Arc::new(MemoryRecordStore::new());
        let logger = AuditLogger::new(ParamLookup::new(fast.clone()), store.clone());
        (logger, fast, store)
    }

    #[tokio::test]
    async fn test_writes_when_enabled() {
        let (logger, _, store) = setup(Some(LOG_ENABLED)).await;

        assert!(logger.write_log("login", "failed password for bob").await.unwrap());

        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].tag, "login");
        assert_eq!(logs[0].content, "failed password for bob");
        assert_eq!(logs[0].created_at, logs[0].log_time);
        assert_eq!(logs[0].updated_at, logs[0].log_time);
    }

    #[tokio::test]
    async fn test_silent_when_disabled_or_absent() {
        let (logger, _, store) = setup(Some("Disable")).await;
        assert!(!logger.write_log("login", "x").await.unwrap());
        assert!(store.logs().is_empty());

        let (logger, _, store) = setup(None).await;
        assert!(!logger.write_log("login", "x").await.unwrap());
        assert!(store.logs().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_read_failure_skips_logging() {
        let (logger, fast, store) = setup(Some(LOG_ENABLED)).await;
        fast.set_available(false);

        assert!(!logger.write_log("login", "x").await.unwrap());
        assert!(store.logs().is_empty());
    }

    #[tokio::test]
    async fn test_append_failure_propagates() {
        let (logger, _, store) = setup(Some(LOG_ENABLED)).await;
        store.set_available(false);

        assert!(logger.write_log("login", "x").await.is_err());
    }
}

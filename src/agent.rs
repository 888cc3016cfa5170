//! Blacklist agent: wires the tracker, warm-up and audit log to their stores.

use crate::audit::AuditLogger;
use crate::cache::BlacklistCache;
use crate::config::Config;
use crate::params::{ParamLookup, PARAM_NAMESPACE};
use crate::store::memory::{MemoryHashStore, MemoryRecordStore};
use crate::store::{HashStore, LogStore, RecordStore, StoreError};
use crate::tracker::{SignOutcome, SignalTracker};
use crate::warmup::BlacklistWarmup;
use std::sync::Arc;
use tracing::info;

/// Storage collaborators of the agent.
#[derive(Clone)]
pub struct Backends {
    /// Durable signal records.
    pub records: Arc<dyn RecordStore>,
    /// Durable security log.
    pub logs: Arc<dyn LogStore>,
    /// Fast namespaced store (blacklist cache and parameters).
    pub fast: Arc<dyn HashStore>,
}

impl Backends {
    /// In-process backends. Nothing survives the process.
    pub fn in_memory() -> Self {
        let durable = Arc::new(MemoryRecordStore::new());
        Self {
            records: durable.clone(),
            logs: durable,
            fast: Arc::new(MemoryHashStore::new()),
        }
    }
}

/// Blacklist agent.
///
/// Entry point for the request layer: every operation is a plain async call
/// that fails with the first storage error it hits.
pub struct BlacklistAgent {
    tracker: SignalTracker,
    warmup: BlacklistWarmup,
    audit: AuditLogger,
    blacklist: BlacklistCache,
}

impl BlacklistAgent {
    /// Create an agent over existing backends without touching them.
    pub fn with_backends(backends: Backends) -> Self {
        let params = ParamLookup::new(backends.fast.clone());
        let blacklist = BlacklistCache::new(backends.fast.clone());

        Self {
            tracker: SignalTracker::new(
                params.clone(),
                backends.records.clone(),
                blacklist.clone(),
            ),
            warmup: BlacklistWarmup::new(backends.records, blacklist.clone()),
            audit: AuditLogger::new(params, backends.logs),
            blacklist,
        }
    }

    /// Create an agent, seed its parameters from `config` and, if enabled,
    /// rebuild the blacklist cache.
    pub async fn new(config: &Config, backends: Backends) -> Result<Self, StoreError> {
        let entries = config.params.entries();
        let seeded = entries.len();
        if !entries.is_empty() {
            backends.fast.set_many(PARAM_NAMESPACE, entries).await?;
        }

        let agent = Self::with_backends(backends);

        let loaded = if config.settings.warm_up_on_start {
            agent.load_blacklist().await?
        } else {
            0
        };

        info!(
            params = seeded,
            blacklisted = loaded,
            warm_up = config.settings.warm_up_on_start,
            "Blacklist agent initialized"
        );

        Ok(agent)
    }

    /// Record one strike against an address.
    pub async fn sign_address(&self, address: &str) -> Result<SignOutcome, StoreError> {
        self.tracker.sign_address(address).await
    }

    /// Remove an address's record. Its cache entry, if any, stays.
    pub async fn unsign_address(&self, address: &str) -> Result<bool, StoreError> {
        self.tracker.unsign_address(address).await
    }

    /// Record one strike against an account.
    pub async fn sign_account(&self, account: &str) -> Result<SignOutcome, StoreError> {
        self.tracker.sign_account(account).await
    }

    /// Remove an account's record.
    pub async fn unsign_account(&self, account: &str) -> Result<bool, StoreError> {
        self.tracker.unsign_account(account).await
    }

    /// Check if an account is frozen.
    pub async fn account_is_frozen(&self, account: &str) -> Result<bool, StoreError> {
        self.tracker.account_is_frozen(account).await
    }

    /// Check if an address is listed in the blacklist cache.
    ///
    /// May lag the record store: entries appear only once published and are
    /// not removed by unsign.
    pub async fn address_is_blacklisted(&self, address: &str) -> Result<bool, StoreError> {
        self.blacklist.contains(address).await
    }

    /// Rebuild the blacklist cache from the record store.
    pub async fn load_blacklist(&self) -> Result<usize, StoreError> {
        self.warmup.load_blacklist().await
    }

    /// Write a security audit entry if audit logging is enabled.
    pub async fn write_log(&self, tag: &str, content: &str) -> Result<bool, StoreError> {
        self.audit.write_log(tag, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Params, Settings};
    use crate::params::{LOG_ENABLED, SECURITY_LOG_KEY};
    use crate::record::{SignalRecord, SubjectType};
    use chrono::Utc;

    fn config(address: Option<i64>, account: Option<i64>, warm_up: bool) -> Config {
        Config {
            settings: Settings {
                warm_up_on_start: warm_up,
            },
            params: Params {
                address_security: address,
                account_security: account,
                security_log: Some(true),
            },
        }
    }

    #[tokio::test]
    async fn test_new_seeds_params() {
        let fast = Arc::new(MemoryHashStore::new());
        let backends = Backends {
            fast: fast.clone(),
            ..Backends::in_memory()
        };

        let agent = BlacklistAgent::new(&config(Some(2), None, false), backends)
            .await
            .unwrap();

        assert_eq!(
            fast.get(PARAM_NAMESPACE, "address_security").await.unwrap().as_deref(),
            Some("2")
        );
        assert_eq!(agent.sign_account("bob").await.unwrap(), SignOutcome::Disabled);
        assert!(agent.write_log("login", "seeded").await.unwrap());
    }

    #[tokio::test]
    async fn test_new_keeps_params_missing_from_config() {
        let fast = Arc::new(MemoryHashStore::new());
        fast.set(PARAM_NAMESPACE, SECURITY_LOG_KEY, LOG_ENABLED.to_string())
            .await
            .unwrap();
        fast.set(PARAM_NAMESPACE, "address_security", "4".to_string())
            .await
            .unwrap();
        let backends = Backends {
            fast: fast.clone(),
            ..Backends::in_memory()
        };

        let agent = BlacklistAgent::new(&Config::default(), backends)
            .await
            .unwrap();

        assert_eq!(
            fast.get(PARAM_NAMESPACE, SECURITY_LOG_KEY).await.unwrap().as_deref(),
            Some(LOG_ENABLED)
        );
        assert_eq!(
            fast.get(PARAM_NAMESPACE, "address_security").await.unwrap().as_deref(),
            Some("4")
        );
        assert!(agent.write_log("login", "kept").await.unwrap());
    }

    #[tokio::test]
    async fn test_new_warms_cache_from_store() {
        let records = Arc::new(MemoryRecordStore::new());
        let mut record = SignalRecord::first_signal(SubjectType::Address, "1.2.3.4", Utc::now());
        record.strike_status = 0;
        records.upsert(&record).await.unwrap();

        let backends = Backends {
            records: records.clone(),
            logs: records,
            fast: Arc::new(MemoryHashStore::new()),
        };

        let agent = BlacklistAgent::new(&config(Some(2), None, true), backends)
            .await
            .unwrap();
        assert!(agent.address_is_blacklisted("1.2.3.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let agent = BlacklistAgent::new(&config(Some(1), Some(1), true), Backends::in_memory())
            .await
            .unwrap();

        agent.sign_address("1.2.3.4").await.unwrap();
        assert!(!agent.address_is_blacklisted("1.2.3.4").await.unwrap());
        agent.sign_address("1.2.3.4").await.unwrap();
        assert!(agent.address_is_blacklisted("1.2.3.4").await.unwrap());

        agent.sign_account("bob").await.unwrap();
        agent.sign_account("bob").await.unwrap();
        assert!(agent.account_is_frozen("bob").await.unwrap());
        assert!(!agent.address_is_blacklisted("bob").await.unwrap());

        assert!(agent.unsign_account("bob").await.unwrap());
        assert!(!agent.account_is_frozen("bob").await.unwrap());

        assert!(agent.unsign_address("1.2.3.4").await.unwrap());
        assert!(agent.address_is_blacklisted("1.2.3.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_new_fails_when_fast_store_down() {
        let fast = Arc::new(MemoryHashStore::new());
        fast.set_available(false);
        let backends = Backends {
            fast,
            ..Backends::in_memory()
        };

        let config = config(Some(2), None, false);
        assert!(BlacklistAgent::new(&config, backends).await.is_err());
    }
}

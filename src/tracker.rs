//! Signal tracker: strike counting and escalation to the blacklist.

use crate::cache::BlacklistCache;
use crate::params::ParamLookup;
use crate::record::{SignalRecord, Strike, SubjectType};
use crate::store::{RecordStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// What a signal did to its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
    /// No positive threshold is configured for the subject type.
    Disabled,
    /// First signal: a record was created with one strike.
    Created,
    /// Strike counted, subject still active.
    Struck { strikes: u32 },
    /// Threshold exceeded: subject is now blacklisted.
    Escalated,
    /// Address already blacklisted: cache snapshot re-published.
    Refreshed,
    /// Account already blacklisted: nothing touched.
    Ignored,
}

/// Applies signals and their removal to tracked subjects.
///
/// Each call is a sequence of independent store calls with no atomicity
/// between the read of a record and its write. The cache and record store
/// are never written in one transaction. On escalation an address is
/// published to the cache before its record is persisted, so a failed record
/// write leaves the address cached while the stored record keeps its previous
/// strike count.
#[derive(Clone)]
pub struct SignalTracker {
    params: ParamLookup,
    records: Arc<dyn RecordStore>,
    blacklist: BlacklistCache,
}

impl SignalTracker {
    pub fn new(
        params: ParamLookup,
        records: Arc<dyn RecordStore>,
        blacklist: BlacklistCache,
    ) -> Self {
        Self {
            params,
            records,
            blacklist,
        }
    }

    /// Record one strike against an address.
    pub async fn sign_address(&self, address: &str) -> Result<SignOutcome, StoreError> {
        self.sign(SubjectType::Address, address).await
    }

    /// Remove an address's record.
    pub async fn unsign_address(&self, address: &str) -> Result<bool, StoreError> {
        self.unsign(SubjectType::Address, address).await
    }

    /// Record one strike against an account.
    pub async fn sign_account(&self, account: &str) -> Result<SignOutcome, StoreError> {
        self.sign(SubjectType::Account, account).await
    }

    /// Remove an account's record.
    pub async fn unsign_account(&self, account: &str) -> Result<bool, StoreError> {
        self.unsign(SubjectType::Account, account).await
    }

    /// Check if an account is blacklisted. Reads the record store directly.
    pub async fn account_is_frozen(&self, account: &str) -> Result<bool, StoreError> {
        let record = self.records.find(SubjectType::Account, account).await?;
        Ok(record.is_some_and(|r| r.is_blacklisted()))
    }

    /// Record one strike against a subject.
    pub async fn sign(
        &self,
        subject_type: SubjectType,
        subject_value: &str,
    ) -> Result<SignOutcome, StoreError> {
        let Some(threshold) = self.params.threshold(subject_type).await? else {
            return Ok(SignOutcome::Disabled);
        };

        let now = Utc::now();
        let Some(mut record) = self.records.find(subject_type, subject_value).await? else {
            let record = SignalRecord::first_signal(subject_type, subject_value, now);
            self.records.upsert(&record).await?;
            debug!(
                subject_type = %subject_type,
                subject = subject_value,
                "First signal recorded"
            );
            return Ok(SignOutcome::Created);
        };

        if record.is_blacklisted() {
            // Addresses re-publish on every repeat signal; accounts are left alone.
            if subject_type.is_cached() {
                self.blacklist.publish(&record).await?;
                debug!(subject = subject_value, "Blacklist entry refreshed");
                return Ok(SignOutcome::Refreshed);
            }
            return Ok(SignOutcome::Ignored);
        }

        let outcome = match record.strike(threshold, now) {
            Strike::Counted(strikes) => {
                debug!(
                    subject_type = %subject_type,
                    subject = subject_value,
                    strikes,
                    threshold,
                    "Strike recorded"
                );
                SignOutcome::Struck { strikes }
            }
            Strike::Escalated => {
                if subject_type.is_cached() {
                    self.blacklist.publish(&record).await?;
                }
                info!(
                    subject_type = %subject_type,
                    subject = subject_value,
                    threshold,
                    "Subject blacklisted"
                );
                SignOutcome::Escalated
            }
        };

        self.records.upsert(&record).await?;
        Ok(outcome)
    }

    /// Delete a subject's record regardless of its status.
    ///
    /// The blacklist cache is not touched, so a cached address stays listed
    /// until the cache is rebuilt.
    pub async fn unsign(
        &self,
        subject_type: SubjectType,
        subject_value: &str,
    ) -> Result<bool, StoreError> {
        let removed = self.records.delete(subject_type, subject_value).await?;
        debug!(
            subject_type = %subject_type,
            subject = subject_value,
            removed,
            "Subject unsigned"
        );
        Ok(removed)
    }
}

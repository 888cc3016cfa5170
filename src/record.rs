//! Signal records and security log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strike status of a blacklisted subject.
pub const BLACKLISTED: u32 = 0;

/// Kind of subject being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum SubjectType {
    /// Network address of a client.
    Address,
    /// User account.
    Account,
}

impl SubjectType {
    /// All subject types, in a stable order.
    pub const ALL: [SubjectType; 2] = [SubjectType::Address, SubjectType::Account];

    /// Name used when the subject type is persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Address => "Address",
            SubjectType::Account => "Account",
        }
    }

    /// Key of the strike threshold parameter for this subject type.
    pub fn threshold_key(&self) -> &'static str {
        match self {
            SubjectType::Address => "address_security",
            SubjectType::Account => "account_security",
        }
    }

    /// Whether blacklisted subjects of this type are mirrored into the
    /// blacklist cache.
    pub fn is_cached(&self) -> bool {
        match self {
            SubjectType::Address => true,
            SubjectType::Account => false,
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record per (subject type, subject value).
///
/// `strike_status` is the current consecutive strike count while the subject
/// is active, and [`BLACKLISTED`] once it has crossed its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignalRecord {
    pub subject_type: SubjectType,
    pub subject_value: String,
    pub strike_status: u32,
    /// Time of the most recent signal.
    pub last_signal_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of applying one strike to an active record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// Still active with this many strikes.
    Counted(u32),
    /// Crossed the threshold and is now blacklisted.
    Escalated,
}

impl SignalRecord {
    /// Record for the first signal ever seen against a subject.
    pub fn first_signal(
        subject_type: SubjectType,
        subject_value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_type,
            subject_value: subject_value.into(),
            strike_status: 1,
            last_signal_time: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this subject is blacklisted.
    pub fn is_blacklisted(&self) -> bool {
        self.strike_status == BLACKLISTED
    }

    /// Apply one more strike to an active record.
    ///
    /// Escalates to [`BLACKLISTED`] once the incremented count exceeds
    /// `threshold`. Must not be called on a blacklisted record.
    pub fn strike(&mut self, threshold: u32, now: DateTime<Utc>) -> Strike {
        debug_assert!(!self.is_blacklisted());

        self.last_signal_time = now;
        self.updated_at = now;
        self.strike_status = self.strike_status.saturating_add(1);

        if self.strike_status > threshold {
            self.strike_status = BLACKLISTED;
            Strike::Escalated
        } else {
            Strike::Counted(self.strike_status)
        }
    }
}

/// Audit log entry for a security event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecurityLogEntry {
    pub tag: String,
    pub content: String,
    pub log_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecurityLogEntry {
    /// Create an entry stamped with `now`.
    pub fn new(tag: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            tag: tag.into(),
            content: content.into(),
            log_time: now,
            created_at: now,
            updated_at: now,
        }
    }
}

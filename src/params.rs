//! Runtime parameters read from the `param` namespace of the fast store.

use crate::record::SubjectType;
use crate::store::{HashStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// Namespace holding runtime parameters.
pub const PARAM_NAMESPACE: &str = "param";

/// Key of the audit log toggle.
pub const SECURITY_LOG_KEY: &str = "security_log";

/// Toggle value that enables audit logging. Compared exactly.
pub const LOG_ENABLED: &str = "Enable";

/// Toggle value written when audit logging is disabled.
pub const LOG_DISABLED: &str = "Disable";

/// Read-through accessor for runtime parameters.
///
/// Holds no state of its own: every call re-reads the store, so parameter
/// changes take effect on the next signal.
#[derive(Clone)]
pub struct ParamLookup {
    store: Arc<dyn HashStore>,
}

impl ParamLookup {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self { store }
    }

    /// Strike threshold for a subject type.
    ///
    /// `None` means signaling is disabled for that type: the parameter is
    /// absent, not an integer, or not positive.
    pub async fn threshold(&self, subject_type: SubjectType) -> Result<Option<u32>, StoreError> {
        let key = subject_type.threshold_key();
        let raw = self.store.get(PARAM_NAMESPACE, key).await?;
        let threshold = raw.as_deref().and_then(parse_threshold);

        if threshold.is_none() {
            debug!(param = key, value = ?raw, "Signaling disabled");
        }

        Ok(threshold)
    }

    /// Whether audit logging is enabled.
    pub async fn logging_enabled(&self) -> Result<bool, StoreError> {
        let value = self.store.get(PARAM_NAMESPACE, SECURITY_LOG_KEY).await?;
        Ok(value.as_deref() == Some(LOG_ENABLED))
    }
}

/// Parse a threshold value as a 32-bit integer, keeping only positive values.
pub fn parse_threshold(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|limit| *limit > 0)
        .map(|limit| limit as u32)
}

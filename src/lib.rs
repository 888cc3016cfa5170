//! Blacklist Agent for Zentinel.
//!
//! Counts repeated suspicious-activity signals against client addresses and
//! user accounts, and escalates a subject to the blacklist once it exceeds a
//! configurable strike threshold.
//!
//! # Features
//!
//! - **Strike Tracking** - One durable record per subject, counting consecutive signals
//! - **Per-Type Thresholds** - Separate address and account thresholds, re-read on every signal
//! - **Blacklist Cache** - Blacklisted addresses mirrored into a fast key-value namespace
//! - **Warm-up** - Rebuild the cache from the record store after a restart or flush
//! - **Frozen Accounts** - Account checks read the durable store directly
//! - **Audit Log** - Security events written when the `security_log` toggle is on
//!
//! # Example Configuration
//!
//! ```yaml
//! settings:
//!   warm_up_on_start: true
//!
//! params:
//!   address_security: 5
//!   account_security: 3
//!   security_log: true
//! ```

pub mod agent;
pub mod audit;
pub mod cache;
pub mod config;
pub mod params;
pub mod record;
pub mod store;
pub mod tracker;
pub mod warmup;

pub use agent::{Backends, BlacklistAgent};
pub use config::Config;
pub use record::{SignalRecord, SubjectType};
pub use store::StoreError;
pub use tracker::SignOutcome;

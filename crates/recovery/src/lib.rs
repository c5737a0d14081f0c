//! Guardian-mediated recovery kit and request lifecycle for the
//! Sovereign Recovery protocol.
//!
//! A recovery kit splits an owner's secret phrase into three shards:
//! one kept locally and two encrypted for guardians. Recovering later
//! requires any two shards, and an unauthenticated recovery attempt
//! can always be vetoed by the owner within the timelock window.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod kit;
mod notifier;
mod service;

pub use error::Error;
pub use kit::{decrypt_guardian_share, recover_mnemonic, RecoveryKit};
pub use notifier::{NotificationError, RecoveryNotifier, TracingNotifier};
pub use service::{
    RecoveryOptions, RecoveryService, RecoveryStatus, DEFAULT_TIMELOCK_HOURS,
};

/// Result type for the library.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Normalize an email identifier before lookups and key derivation.
///
/// Guardian keys are derived from the identity string, so the same
/// normalization must be applied everywhere or a case change would
/// silently derive a different key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

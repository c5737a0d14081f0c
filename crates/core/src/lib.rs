//! Core types and cryptography for the Sovereign Recovery protocol.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod crypto;
mod date_time;
mod error;

pub use date_time::UtcDateTime;
pub use error::Error;

/// Result type for the library.
pub(crate) type Result<T> = std::result::Result<T, Error>;

use rand::{rngs::OsRng, CryptoRng, Rng};
use serde::{Deserialize, Serialize};

/// Exposes the default cryptographically secure RNG.
///
/// This is the only source of randomness in the subsystem; there is
/// no fallback to a weaker source.
pub fn csprng() -> impl CryptoRng + Rng {
    OsRng
}

/// Identifier for an account owner.
pub type OwnerId = uuid::Uuid;

/// Identifier for a guardian.
pub type GuardianId = uuid::Uuid;

/// Identifier for a recovery request.
pub type RecoveryRequestId = uuid::Uuid;

/// Invitation status of a guardian.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GuardianStatus {
    /// Invited but not yet accepted.
    Pending = 0,
    /// Accepted the invitation and may hold a shard.
    Active = 1,
}

impl GuardianStatus {
    /// Storage representation.
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }
}

impl TryFrom<i64> for GuardianStatus {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Ok(match value {
            0 => Self::Pending,
            1 => Self::Active,
            _ => return Err(Error::UnknownStatus(value)),
        })
    }
}

/// State of a recovery request.
///
/// `Cancelled` and `Completed` are terminal; the transition to
/// `Completed` is owned by the surrounding identity system, never
/// by this subsystem.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RequestStatus {
    /// Awaiting the timelock; may still be vetoed.
    Pending = 0,
    /// Vetoed by the owner.
    Cancelled = 1,
    /// Recovered by the surrounding identity system.
    Completed = 2,
}

impl RequestStatus {
    /// Storage representation.
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }
}

impl TryFrom<i64> for RequestStatus {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Ok(match value {
            0 => Self::Pending,
            1 => Self::Cancelled,
            2 => Self::Completed,
            _ => return Err(Error::UnknownStatus(value)),
        })
    }
}

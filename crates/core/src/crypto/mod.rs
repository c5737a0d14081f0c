//! Cryptographic routines for the recovery protocol.
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

pub mod guardian;
pub mod mnemonic;
pub mod shamir;
pub mod token;

/// Number of shares a secret is split into.
pub const SHARE_COUNT: usize = 3;

/// Number of shares required to reconstruct a secret.
pub const SHARE_THRESHOLD: usize = 2;

/// Number of shares held by guardians.
///
/// The remaining share is the local share which is never
/// persisted server-side.
pub const GUARDIAN_SHARE_COUNT: usize = SHARE_COUNT - 1;

/// Size of the mnemonic entropy in bytes (128 bits, 12 words).
pub const ENTROPY_SIZE: usize = 16;

/// Size of a key derivation salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Encrypted shard blob with the salt used to derive its key.
///
/// The blob layout is `nonce ‖ ciphertext ‖ tag`; both fields are
/// opaque and stored as base64.
#[serde_as]
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct EncryptedShard {
    /// Encrypted shard bytes.
    #[serde_as(as = "Base64")]
    pub ciphertext: Vec<u8>,
    /// Key derivation salt.
    #[serde_as(as = "Base64")]
    pub salt: [u8; SALT_SIZE],
}

/// Shard payload submitted by an owner on behalf of a guardian.
///
/// Strict parse-or-reject; unknown fields are an error so that
/// security-sensitive payloads are never read from an open map.
#[serde_as]
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryShardPayload {
    /// Email address of the guardian holding this shard.
    pub guardian_email: String,
    /// Encrypted shard blob.
    #[serde_as(as = "Base64")]
    pub encrypted: Vec<u8>,
    /// Key derivation salt.
    #[serde_as(as = "Base64")]
    pub salt: [u8; SALT_SIZE],
}

//! One-time veto tokens for cancelling a recovery request.
//!
//! Only the SHA-256 of a token is ever stored; the raw token exists
//! in the cancel link and nowhere else.
use crate::csprng;
use rand::Rng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Size of a raw token in bytes.
pub const TOKEN_SIZE: usize = 32;

/// Generate a fresh veto token.
///
/// Returns the raw token as hex for embedding in the cancel link,
/// and the hash to persist.
pub fn generate() -> (Zeroizing<String>, String) {
    let mut bytes = Zeroizing::new([0u8; TOKEN_SIZE]);
    csprng().fill(bytes.as_mut_slice());
    let raw = Zeroizing::new(hex::encode(bytes.as_slice()));
    let digest = hash(raw.as_str());
    (raw, digest)
}

/// Hash a presented token for lookup.
///
/// The token is hashed exactly as received; malformed input simply
/// hashes to a value that matches nothing, so there is no separate
/// validation step to leak through.
pub fn hash(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

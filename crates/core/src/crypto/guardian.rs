//! Guardian-scoped authenticated encryption for recovery shards.
//!
//! The key for a shard is derived from the guardian's identity string
//! and a per-encryption salt. There is no server-held master key, so
//! a server compromise alone cannot decrypt stored shards.
use crate::{
    crypto::{EncryptedShard, NONCE_SIZE, SALT_SIZE},
    csprng, Error, Result,
};
use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use hmac::Hmac;
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroizing;

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// OWASP-aligned floor as of 2024; must never be lowered.
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Size of the derived AES-256 key in bytes.
const KEY_SIZE: usize = 32;

/// Size of the AES-GCM authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// Derive the guardian-scoped AES-256 key.
pub fn derive_key(
    identifier: &str,
    salt: &[u8; SALT_SIZE],
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(
        identifier.as_bytes(),
        salt,
        PBKDF2_ITERATIONS,
        key.as_mut_slice(),
    )
    .map_err(|_| Error::KeyDerivation)?;
    Ok(key)
}

/// Encrypt one shard for a guardian.
///
/// Generates a fresh salt and nonce per call; the returned blob is
/// `nonce ‖ ciphertext ‖ tag`.
pub fn encrypt(shard: &[u8], identifier: &str) -> Result<EncryptedShard> {
    let mut salt = [0u8; SALT_SIZE];
    csprng().fill(&mut salt);
    let key = derive_key(identifier, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| Error::EncryptionFailed)?;

    let mut nonce = [0u8; NONCE_SIZE];
    csprng().fill(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), shard)
        .map_err(|_| Error::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(EncryptedShard {
        ciphertext: blob,
        salt,
    })
}

/// Decrypt a shard blob with the key derived from `identifier` and
/// the stored salt.
///
/// All failure causes collapse into [`Error::DecryptionFailed`] so the
/// error surface cannot be used as an oracle.
pub fn decrypt(
    blob: &[u8],
    salt: &[u8; SALT_SIZE],
    identifier: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    let key = derive_key(identifier, salt)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|_| Error::DecryptionFailed)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

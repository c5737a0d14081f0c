use anyhow::Result;
use svr_core::{crypto::guardian, Error};

const SHARD: &[u8] = b"mock shard bytes";
const GUARDIAN: &str = "guardian@example.com";

#[test]
fn guardian_cipher_round_trip() -> Result<()> {
    let encrypted = guardian::encrypt(SHARD, GUARDIAN)?;
    let decrypted =
        guardian::decrypt(&encrypted.ciphertext, &encrypted.salt, GUARDIAN)?;
    assert_eq!(SHARD, decrypted.as_slice());
    Ok(())
}

#[test]
fn guardian_cipher_fresh_salt_and_nonce() -> Result<()> {
    let first = guardian::encrypt(SHARD, GUARDIAN)?;
    let second = guardian::encrypt(SHARD, GUARDIAN)?;
    assert_ne!(first.salt, second.salt);
    assert_ne!(first.ciphertext, second.ciphertext);
    Ok(())
}

#[test]
fn guardian_cipher_wrong_identity() -> Result<()> {
    let encrypted = guardian::encrypt(SHARD, GUARDIAN)?;
    let result = guardian::decrypt(
        &encrypted.ciphertext,
        &encrypted.salt,
        "other@example.com",
    );
    assert!(matches!(result, Err(Error::DecryptionFailed)));
    Ok(())
}

#[test]
fn guardian_cipher_wrong_salt() -> Result<()> {
    let encrypted = guardian::encrypt(SHARD, GUARDIAN)?;
    let mut salt = encrypted.salt;
    salt[0] ^= 0x01;
    let result =
        guardian::decrypt(&encrypted.ciphertext, &salt, GUARDIAN);
    assert!(matches!(result, Err(Error::DecryptionFailed)));
    Ok(())
}

#[test]
fn guardian_cipher_tampered_ciphertext() -> Result<()> {
    let mut encrypted = guardian::encrypt(SHARD, GUARDIAN)?;
    let last = encrypted.ciphertext.len() - 1;
    encrypted.ciphertext[last] ^= 0x01;
    let result = guardian::decrypt(
        &encrypted.ciphertext,
        &encrypted.salt,
        GUARDIAN,
    );
    assert!(matches!(result, Err(Error::DecryptionFailed)));
    Ok(())
}

#[test]
fn guardian_cipher_truncated_blob() -> Result<()> {
    let encrypted = guardian::encrypt(SHARD, GUARDIAN)?;
    let result = guardian::decrypt(
        &encrypted.ciphertext[..8],
        &encrypted.salt,
        GUARDIAN,
    );
    assert!(matches!(result, Err(Error::DecryptionFailed)));
    Ok(())
}

//! Threshold secret sharing over GF(256), 2-of-3.
//!
//! Any two shares reconstruct the secret exactly; a single share
//! carries no information about it. Secrets keep their exact byte
//! length, there is no padding or truncation.
use crate::{
    csprng,
    crypto::{SHARE_COUNT, SHARE_THRESHOLD},
    Error, Result,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use sharks::{Share, Sharks};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Length of the truncated SHA-256 integrity checksum.
const CHECKSUM_SIZE: usize = 4;

/// One fragment of a split secret.
///
/// The encoded form is `x ‖ y-bytes ‖ checksum` where the checksum is
/// the first four bytes of the SHA-256 of the share body. Shamir
/// interpolation alone will happily combine corrupted shares into a
/// plausible wrong secret, so the checksum is what turns gross
/// corruption into an error.
#[derive(Clone, Eq, PartialEq)]
pub struct SecretShare(Vec<u8>);

impl SecretShare {
    /// The x-coordinate of this share.
    pub fn index(&self) -> u8 {
        self.0[0]
    }

    /// Encode with the integrity checksum appended.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(self.0.len() + CHECKSUM_SIZE);
        bytes.extend_from_slice(&self.0);
        bytes.extend_from_slice(&checksum(&self.0));
        bytes
    }

    /// Decode and verify the integrity checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        // x-coordinate, at least one y-byte, checksum
        if bytes.len() < 2 + CHECKSUM_SIZE {
            return Err(Error::ShareEncoding);
        }
        let (body, sum) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
        if checksum(body) != sum {
            return Err(Error::CorruptShare(body[0]));
        }
        Ok(Self(body.to_vec()))
    }

    /// Encode as base64 with the integrity checksum appended.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode from base64 and verify the integrity checksum.
    pub fn from_base64(value: &str) -> Result<Self> {
        let bytes =
            STANDARD.decode(value).map_err(|_| Error::ShareEncoding)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index())
            .finish_non_exhaustive()
    }
}

impl Drop for SecretShare {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

fn checksum(body: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha256::digest(body);
    let mut sum = [0u8; CHECKSUM_SIZE];
    sum.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    sum
}

/// Split a secret into three shares, any two of which reconstruct it.
///
/// Index 0 of the returned array is the local share; indices 1 and 2
/// are the guardian shares.
pub fn split(secret: &[u8]) -> Result<[SecretShare; SHARE_COUNT]> {
    let sharks = Sharks(SHARE_THRESHOLD as u8);
    let mut rng = csprng();
    let shares: Vec<SecretShare> = sharks
        .dealer_rng(secret, &mut rng)
        .take(SHARE_COUNT)
        .map(|share| SecretShare(Vec::from(&share)))
        .collect();
    shares.try_into().map_err(|_| Error::ShareEncoding)
}

/// Reconstruct a secret from at least two shares by Lagrange
/// interpolation at x = 0.
pub fn combine(shares: &[SecretShare]) -> Result<Zeroizing<Vec<u8>>> {
    if shares.len() < SHARE_THRESHOLD {
        return Err(Error::InsufficientShares(SHARE_THRESHOLD));
    }
    let mut parsed = Vec::with_capacity(shares.len());
    for share in shares {
        parsed.push(
            Share::try_from(share.0.as_slice())
                .map_err(|_| Error::ShareEncoding)?,
        );
    }
    let sharks = Sharks(SHARE_THRESHOLD as u8);
    let secret = sharks
        .recover(parsed.iter())
        .map_err(|_| Error::InsufficientShares(SHARE_THRESHOLD))?;
    Ok(Zeroizing::new(secret))
}

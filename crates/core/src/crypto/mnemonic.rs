//! BIP-39 codec between the recovery phrase and raw entropy.
use crate::{crypto::ENTROPY_SIZE, csprng, Error, Result};
use bip39::{Language, Mnemonic};
use rand::Rng;
use zeroize::Zeroizing;

/// Number of words in a recovery phrase.
pub const WORD_COUNT: usize = 12;

/// Generate a fresh 12-word phrase from 128 bits of CSPRNG entropy.
pub fn generate() -> Result<Zeroizing<String>> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_SIZE]);
    csprng().fill(entropy.as_mut_slice());
    from_entropy(&entropy)
}

/// Encode entropy as a 12-word phrase.
pub fn from_entropy(entropy: &[u8; ENTROPY_SIZE]) -> Result<Zeroizing<String>> {
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|_| Error::InvalidMnemonic)?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Validate a phrase and decode it to raw entropy.
///
/// Checks wordlist membership, the BIP-39 checksum and the
/// 12-word length.
pub fn to_entropy(phrase: &str) -> Result<Zeroizing<[u8; ENTROPY_SIZE]>> {
    let mnemonic = Mnemonic::parse_in(Language::English, phrase)
        .map_err(|_| Error::InvalidMnemonic)?;
    if mnemonic.word_count() != WORD_COUNT {
        return Err(Error::InvalidMnemonic);
    }
    let entropy = Zeroizing::new(mnemonic.to_entropy());
    let mut out = Zeroizing::new([0u8; ENTROPY_SIZE]);
    out.copy_from_slice(entropy.as_slice());
    Ok(out)
}

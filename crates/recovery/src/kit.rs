//! Recovery kit creation and phrase reconstruction.
use crate::{normalize_email, Result};
use svr_core::{
    crypto::{
        guardian, mnemonic, shamir, shamir::SecretShare,
        RecoveryShardPayload, ENTROPY_SIZE, GUARDIAN_SHARE_COUNT,
    },
    Error,
};
use zeroize::Zeroizing;

/// A freshly generated recovery kit.
///
/// The mnemonic and the local share exist only in this value; the
/// caller is responsible for handing them to the owner. Only the
/// guardian shards, already encrypted, are fit for submission to
/// the server.
pub struct RecoveryKit {
    /// The 12-word recovery phrase.
    pub mnemonic: Zeroizing<String>,
    /// The share the owner keeps on their own device.
    pub local_share: SecretShare,
    /// Encrypted shards, one per guardian.
    pub guardian_shards: Vec<RecoveryShardPayload>,
}

impl RecoveryKit {
    /// Generate a kit with a fresh mnemonic.
    pub fn generate(
        guardian_emails: [&str; GUARDIAN_SHARE_COUNT],
    ) -> Result<Self> {
        let mnemonic = mnemonic::generate()?;
        Self::from_phrase(mnemonic, guardian_emails)
    }

    /// Build a kit around an existing mnemonic.
    ///
    /// The phrase is validated before splitting so a typo fails here
    /// rather than after shards are distributed.
    pub fn from_mnemonic(
        phrase: &str,
        guardian_emails: [&str; GUARDIAN_SHARE_COUNT],
    ) -> Result<Self> {
        let entropy = mnemonic::to_entropy(phrase)?;
        let mnemonic = mnemonic::from_entropy(&entropy)?;
        Self::from_phrase(mnemonic, guardian_emails)
    }

    fn from_phrase(
        mnemonic: Zeroizing<String>,
        guardian_emails: [&str; GUARDIAN_SHARE_COUNT],
    ) -> Result<Self> {
        let entropy = mnemonic::to_entropy(&mnemonic)?;
        let [local_share, first, second] =
            shamir::split(entropy.as_slice())?;

        let mut guardian_shards =
            Vec::with_capacity(GUARDIAN_SHARE_COUNT);
        for (email, share) in
            guardian_emails.into_iter().zip([first, second])
        {
            let identifier = normalize_email(email);
            let bytes = Zeroizing::new(share.to_bytes());
            let encrypted = guardian::encrypt(&bytes, &identifier)?;
            guardian_shards.push(RecoveryShardPayload {
                guardian_email: identifier,
                encrypted: encrypted.ciphertext,
                salt: encrypted.salt,
            });
        }

        Ok(RecoveryKit {
            mnemonic,
            local_share,
            guardian_shards,
        })
    }
}

/// Reconstruct the recovery phrase from any two shares.
///
/// Combines the shares, then re-derives the phrase from the recovered
/// entropy. A wrong-length recovery is reported as an invalid
/// mnemonic since the entropy cannot have come from a 12-word phrase.
pub fn recover_mnemonic(
    shares: &[SecretShare],
) -> Result<Zeroizing<String>> {
    let secret = shamir::combine(shares)?;
    let entropy: Zeroizing<[u8; ENTROPY_SIZE]> = Zeroizing::new(
        secret
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidMnemonic)?,
    );
    Ok(mnemonic::from_entropy(&entropy)?)
}

/// Decrypt a guardian's stored shard back into a usable share.
pub fn decrypt_guardian_share(
    encrypted: &[u8],
    salt: &[u8; svr_core::crypto::SALT_SIZE],
    guardian_email: &str,
) -> Result<SecretShare> {
    let identifier = normalize_email(guardian_email);
    let bytes = guardian::decrypt(encrypted, salt, &identifier)?;
    Ok(SecretShare::from_bytes(&bytes)?)
}

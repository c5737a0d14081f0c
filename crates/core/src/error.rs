use thiserror::Error;

/// Errors generated by the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// Phrase failed wordlist, checksum or length validation.
    #[error("invalid mnemonic phrase")]
    InvalidMnemonic,

    /// Too few shares were supplied to reconstruct a secret.
    #[error("insufficient shares, need at least {0}")]
    InsufficientShares(usize),

    /// A share failed its integrity checksum.
    #[error("corrupt share for index {0}")]
    CorruptShare(u8),

    /// A share could not be decoded.
    #[error("invalid share encoding")]
    ShareEncoding,

    /// Authenticated decryption failed.
    ///
    /// Deliberately undifferentiated; a wrong key and a corrupted
    /// ciphertext must be indistinguishable to the caller.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// Key derivation failed.
    #[error("key derivation failed")]
    KeyDerivation,

    /// Unknown status discriminant in stored data.
    #[error("unknown status value {0}")]
    UnknownStatus(i64),

    /// Error formatting a date and time.
    #[error(transparent)]
    TimeFormat(#[from] time::error::Format),

    /// Error parsing a date and time.
    #[error(transparent)]
    TimeParse(#[from] time::error::Parse),

    /// Error decoding base64.
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

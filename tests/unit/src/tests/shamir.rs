use anyhow::Result;
use svr_core::{
    crypto::shamir::{self, SecretShare},
    Error,
};

#[test]
fn shamir_any_two_shares_recover() -> Result<()> {
    let secret = b"an exact length secret";
    let shares = shamir::split(secret)?;

    let pairs = [(0, 1), (0, 2), (1, 2)];
    for (a, b) in pairs {
        let recovered = shamir::combine(&[
            shares[a].clone(),
            shares[b].clone(),
        ])?;
        assert_eq!(secret.as_slice(), recovered.as_slice());
    }

    // All three also work.
    let recovered = shamir::combine(&shares)?;
    assert_eq!(secret.as_slice(), recovered.as_slice());
    Ok(())
}

#[test]
fn shamir_preserves_exact_length() -> Result<()> {
    for len in [1usize, 5, 16, 33] {
        let secret = vec![0xA5u8; len];
        let shares = shamir::split(&secret)?;
        let recovered =
            shamir::combine(&[shares[0].clone(), shares[1].clone()])?;
        assert_eq!(secret, *recovered);
    }
    Ok(())
}

#[test]
fn shamir_single_share_insufficient() -> Result<()> {
    let shares = shamir::split(b"secret")?;
    let result = shamir::combine(&shares[..1]);
    assert!(matches!(result, Err(Error::InsufficientShares(2))));
    Ok(())
}

#[test]
fn shamir_share_indices_distinct() -> Result<()> {
    let shares = shamir::split(b"secret")?;
    assert_ne!(shares[0].index(), shares[1].index());
    assert_ne!(shares[1].index(), shares[2].index());
    assert_ne!(shares[0].index(), shares[2].index());
    Ok(())
}

#[test]
fn shamir_encoding_round_trip() -> Result<()> {
    let shares = shamir::split(b"secret")?;
    for share in &shares {
        let encoded = share.to_base64();
        let decoded = SecretShare::from_base64(&encoded)?;
        assert_eq!(share, &decoded);
    }
    Ok(())
}

#[test]
fn shamir_detects_corruption() -> Result<()> {
    let shares = shamir::split(b"secret")?;
    let mut bytes = shares[1].to_bytes();

    // Flip a bit in the share body.
    bytes[1] ^= 0x01;
    let result = SecretShare::from_bytes(&bytes);
    assert!(matches!(result, Err(Error::CorruptShare(_))));
    Ok(())
}

#[test]
fn shamir_rejects_truncated_encoding() {
    let result = SecretShare::from_bytes(&[0x01, 0x02]);
    assert!(matches!(result, Err(Error::ShareEncoding)));

    let result = SecretShare::from_base64("not base64!");
    assert!(matches!(result, Err(Error::ShareEncoding)));
}

use svr_core::crypto::token;

#[test]
fn token_generate() {
    let (raw, digest) = token::generate();

    // 32 bytes hex encoded.
    assert_eq!(64, raw.len());
    assert!(hex::decode(raw.as_bytes()).is_ok());

    // Stored digest matches the raw token, never equals it.
    assert_eq!(digest, token::hash(&raw));
    assert_ne!(*raw, digest);
}

#[test]
fn token_unique() {
    let (first, _) = token::generate();
    let (second, _) = token::generate();
    assert_ne!(*first, *second);
}

#[test]
fn token_hash_any_input() {
    // Malformed presented tokens hash like any other string so
    // lookup failure is indistinguishable from an unknown token.
    let garbage = token::hash("definitely-not-hex!");
    assert_eq!(64, garbage.len());
    assert_ne!(garbage, token::hash("other"));
    assert_eq!(garbage, token::hash("definitely-not-hex!"));
}

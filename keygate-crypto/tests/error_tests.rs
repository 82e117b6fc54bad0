use keygate_crypto::CryptoError;

#[test]
fn error_display_key_derivation() {
    let err = CryptoError::KeyDerivation("bad params".into());
    assert!(format!("{err}").contains("key derivation failed"));
    assert!(format!("{err}").contains("bad params"));
}

#[test]
fn error_display_decryption_is_opaque() {
    assert_eq!(format!("{}", CryptoError::Decryption), "decryption failed");
}

#[test]
fn error_display_invalid_key_length() {
    let err = CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    };
    let msg = format!("{err}");
    assert!(msg.contains("32"));
    assert!(msg.contains("16"));
}

#[test]
fn error_display_salt_too_short() {
    let msg = format!("{}", CryptoError::SaltTooShort { min: 8, actual: 2 });
    assert!(msg.contains("salt too short"));
}

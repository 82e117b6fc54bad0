use chrono::DateTime;
use keygate_crypto::CryptoError;
use keygate_license::{DecodeError, LicenseError, ValidationError};

#[test]
fn decode_error_display() {
    assert!(format!("{}", DecodeError::EmptyKey).contains("empty"));
    assert!(format!("{}", DecodeError::NotFound).contains("not found"));
    assert!(format!("{}", DecodeError::MissingStore).contains("registry"));
    let msg = format!("{}", DecodeError::MalformedRecord("missing field status".into()));
    assert!(msg.contains("invalid registry record"));
    assert!(msg.contains("status"));
}

#[test]
fn bad_ciphertext_does_not_say_why() {
    let msg = format!("{}", DecodeError::BadCiphertext);
    assert!(!msg.contains("json"));
    assert!(!msg.contains("tag"));
}

#[test]
fn decode_error_displays_transparently() {
    let err: ValidationError = DecodeError::NotFound.into();
    assert_eq!(format!("{err}"), format!("{}", DecodeError::NotFound));
}

#[test]
fn business_rejections_display() {
    let expired = ValidationError::Expired {
        expired_at: DateTime::from_timestamp(0, 0).unwrap(),
    };
    assert!(format!("{expired}").contains("expired"));
    let exhausted = ValidationError::ExhaustedUses {
        current_uses: 100,
        max_uses: 100,
    };
    assert!(format!("{exhausted}").contains("100 of 100"));
    assert!(format!("{}", ValidationError::Disabled).contains("disabled"));
}

#[test]
fn kinds_are_distinct() {
    let errors = [
        ValidationError::ConfigurationMissing,
        DecodeError::EmptyKey.into(),
        DecodeError::BadCiphertext.into(),
        DecodeError::MalformedPayload(String::new()).into(),
        DecodeError::MalformedRecord(String::new()).into(),
        DecodeError::NotFound.into(),
        DecodeError::MissingStore.into(),
        ValidationError::Disabled,
        ValidationError::Expired {
            expired_at: DateTime::from_timestamp(0, 0).unwrap(),
        },
        ValidationError::ExhaustedUses {
            current_uses: 1,
            max_uses: 1,
        },
    ];
    let mut kinds: Vec<_> = errors.iter().map(ValidationError::kind).collect();
    kinds.sort_unstable();
    kinds.dedup();
    assert_eq!(kinds.len(), errors.len());
}

#[test]
fn configuration_errors_are_flagged() {
    assert!(ValidationError::ConfigurationMissing.is_configuration_error());
    assert!(ValidationError::from(DecodeError::MissingStore).is_configuration_error());
    assert!(!ValidationError::from(DecodeError::NotFound).is_configuration_error());
    assert!(!ValidationError::Disabled.is_configuration_error());
}

#[test]
fn license_error_display() {
    assert!(format!("{}", LicenseError::InvalidConfig("x".into())).contains("invalid configuration"));
    assert!(format!("{}", LicenseError::InvalidRegistry("x".into())).contains("invalid registry"));
    assert!(format!("{}", LicenseError::InvalidRecord("x".into())).contains("invalid record"));
    let crypto: LicenseError = CryptoError::Decryption.into();
    assert!(format!("{crypto}").contains("key material"));
}

#[test]
fn license_error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{err}").contains("serialization"));
}

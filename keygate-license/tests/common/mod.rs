//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use keygate_crypto::{CryptoError, DerivedKey, TokenCipher};
use keygate_license::{EntitlementRecord, LicenseStatus, RegistrySnapshot};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 2025-06-01T00:00:00Z.
pub const NOW_SECS: i64 = 1_748_736_000;

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW_SECS, 0).unwrap()
}

/// An active, unexpired, unlimited record.
pub fn active_record(owner: &str) -> EntitlementRecord {
    EntitlementRecord {
        owner_id: owner.to_string(),
        expire_at: None,
        max_uses: None,
        current_uses: 0,
        features: vec!["basic".to_string()],
        status: LicenseStatus::Active,
        created_at: Some(fixed_now() - Duration::days(1)),
    }
}

/// Registry document shaped like a deployed `valid_licenses.json`.
pub fn registry_json() -> String {
    let thirty_days = NOW_SECS + 30 * 24 * 60 * 60;
    json!({
        "licenses": {
            "test123": {
                "user_id": "test_user",
                "expire_time": -1,
                "max_uses": -1,
                "current_uses": 0,
                "features": ["all"],
                "created": "2025-05-31T12:00:00.000000",
                "status": "active"
            },
            "demo456": {
                "user_id": "demo_user",
                "expire_time": thirty_days,
                "max_uses": 100,
                "current_uses": 0,
                "features": ["basic"],
                "created": "2025-05-31T12:00:00.000000",
                "status": "active"
            },
            "admin789": {
                "user_id": "admin_user",
                "expire_time": -1,
                "max_uses": -1,
                "current_uses": 0,
                "features": ["all", "admin"],
                "created": "2025-05-31T12:00:00.000000",
                "status": "active"
            }
        },
        "created": "2025-05-31T12:00:00.000000",
        "mode": "simple"
    })
    .to_string()
}

pub fn seeded_registry() -> RegistrySnapshot {
    RegistrySnapshot::from_json(&registry_json()).unwrap()
}

/// Cipher with a fixed key.
pub fn test_cipher() -> TokenCipher {
    TokenCipher::new(DerivedKey::from_bytes([42u8; 32]))
}

pub fn test_key() -> DerivedKey {
    DerivedKey::from_bytes([42u8; 32])
}

/// Seals a JSON payload into an encrypted license key.
pub fn seal(cipher: &TokenCipher, payload: &Value) -> String {
    cipher.seal(payload.to_string().as_bytes()).unwrap()
}

/// Seals a record in wire form.
pub fn seal_record(cipher: &TokenCipher, record: &EntitlementRecord) -> String {
    seal(cipher, &record.to_wire().unwrap())
}

/// Decrypt capability that counts calls and always fails.
#[derive(Default)]
pub struct CountingDecryptor {
    pub calls: AtomicUsize,
}

impl CountingDecryptor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl keygate_license::DecryptCapability for CountingDecryptor {
    fn decrypt(&self, _raw_key: &str) -> Result<Vec<u8>, CryptoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CryptoError::Decryption)
    }
}

/// Decrypt capability that returns fixed plaintext.
pub struct FixedPlaintext(pub Vec<u8>);

impl keygate_license::DecryptCapability for FixedPlaintext {
    fn decrypt(&self, _raw_key: &str) -> Result<Vec<u8>, CryptoError> {
        Ok(self.0.clone())
    }
}

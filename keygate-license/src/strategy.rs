//! Decode strategies: raw key string to candidate record.
//!
//! Both strategies reject an empty or whitespace-only key before doing any
//! work, and trim surrounding whitespace otherwise.

use crate::error::DecodeError;
use crate::record::EntitlementRecord;
use crate::registry::RegistrySnapshot;
use keygate_crypto::{CryptoError, TokenCipher};

/// Opaque decryption of a key string into payload bytes.
///
/// Implementations must not panic on foreign input.
pub trait DecryptCapability: Send + Sync {
    fn decrypt(&self, raw_key: &str) -> Result<Vec<u8>, CryptoError>;
}

impl DecryptCapability for TokenCipher {
    fn decrypt(&self, raw_key: &str) -> Result<Vec<u8>, CryptoError> {
        self.open(raw_key)
    }
}

/// Turns a raw key into a candidate record, before business rules apply.
pub trait DecodeStrategy {
    fn decode(&self, raw_key: &str) -> Result<EntitlementRecord, DecodeError>;
}

fn non_empty(raw_key: &str) -> Result<&str, DecodeError> {
    let key = raw_key.trim();
    if key.is_empty() {
        Err(DecodeError::EmptyKey)
    } else {
        Ok(key)
    }
}

/// Decrypts the key itself into a self-describing record.
///
/// The payload's `current_uses` and `status` are whatever they were when the
/// key was sealed. There is no store to cross-check, so replaying an old key
/// re-validates against stale usage data.
pub struct EncryptedDecode<'a> {
    capability: &'a dyn DecryptCapability,
}

impl<'a> EncryptedDecode<'a> {
    pub fn new(capability: &'a dyn DecryptCapability) -> Self {
        Self { capability }
    }
}

impl DecodeStrategy for EncryptedDecode<'_> {
    fn decode(&self, raw_key: &str) -> Result<EntitlementRecord, DecodeError> {
        let key = non_empty(raw_key)?;
        let plaintext = self
            .capability
            .decrypt(key)
            .map_err(|_| DecodeError::BadCiphertext)?;
        // Undecodable plaintext reports like a decryption failure.
        let payload: serde_json::Value =
            serde_json::from_slice(&plaintext).map_err(|_| DecodeError::BadCiphertext)?;
        EntitlementRecord::from_payload(&payload)
    }
}

/// Looks the key up in a registry snapshot.
pub struct RegistryLookup<'a> {
    snapshot: Option<&'a RegistrySnapshot>,
}

impl<'a> RegistryLookup<'a> {
    pub fn new(snapshot: Option<&'a RegistrySnapshot>) -> Self {
        Self { snapshot }
    }
}

impl DecodeStrategy for RegistryLookup<'_> {
    fn decode(&self, raw_key: &str) -> Result<EntitlementRecord, DecodeError> {
        let key = non_empty(raw_key)?;
        let snapshot = self.snapshot.ok_or(DecodeError::MissingStore)?;
        let entry = snapshot.get(key).ok_or(DecodeError::NotFound)?;
        EntitlementRecord::from_registry_value(entry)
    }
}

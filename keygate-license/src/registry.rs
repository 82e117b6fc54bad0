//! Registry file snapshot.
//!
//! The registry maps license keys to wire-form records:
//!
//! ```json
//! { "licenses": { "test123": { "user_id": "test_user", ... } }, "mode": "simple" }
//! ```
//!
//! Entries are kept as raw JSON and only converted when looked up, so a
//! single malformed entry rejects its own key and nothing else. Every field,
//! known or not, survives a load/save cycle unchanged.

use crate::error::{LicenseError, LicenseResult};
use crate::record::{CURRENT_USES, EntitlementRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// In-memory copy of a registry file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    licenses: BTreeMap<String, Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RegistrySnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry document.
    pub fn from_json(json: &str) -> LicenseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the registry document, pretty-printed.
    pub fn to_json(&self) -> LicenseResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a registry file.
    pub fn load(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;
        debug!(path = %path.display(), entries = snapshot.len(), "loaded license registry");
        Ok(snapshot)
    }

    /// Writes the registry file through a sibling temp file and a rename, so
    /// readers never see a half-written registry.
    pub fn save(&self, path: impl AsRef<Path>) -> LicenseResult<()> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, self.to_json()?)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), entries = self.len(), "saved license registry");
        Ok(())
    }

    /// Returns the raw entry for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.licenses.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.licenses.contains_key(key)
    }

    /// Iterates over the registered keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.licenses.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    /// Adds or replaces an entry with the wire form of `record`.
    ///
    /// Refuses records that would not read back unchanged at lookup,
    /// including ones without a creation time.
    pub fn insert(&mut self, key: impl Into<String>, record: &EntitlementRecord) -> LicenseResult<()> {
        if record.created_at.is_none() {
            return Err(LicenseError::InvalidRecord(
                "registry records need a creation time".into(),
            ));
        }
        let wire = record.to_wire()?;
        match EntitlementRecord::from_registry_value(&wire) {
            Ok(read_back) if read_back == *record => {}
            Ok(_) => {
                return Err(LicenseError::InvalidRecord(
                    "record does not survive the wire form".into(),
                ));
            }
            Err(err) => return Err(LicenseError::InvalidRecord(err.to_string())),
        }
        self.licenses.insert(key.into(), wire);
        Ok(())
    }

    /// Overwrites `current_uses` for `key`, leaving every other field as is.
    ///
    /// The engine never calls this. Callers that count uses after a
    /// successful validation must serialize their own updates; two
    /// concurrent validations can both observe spare quota.
    pub fn set_current_uses(&mut self, key: &str, uses: u64) -> LicenseResult<()> {
        let entry = self
            .licenses
            .get_mut(key)
            .ok_or_else(|| LicenseError::InvalidRegistry("no entry for license key".into()))?;
        let obj = entry
            .as_object_mut()
            .ok_or_else(|| LicenseError::InvalidRegistry("entry is not an object".into()))?;
        obj.insert(CURRENT_USES.into(), Value::from(uses));
        Ok(())
    }
}

//! Validator configuration file.
//!
//! ```json
//! {
//!   "encryption_key": "<base64url, 32 bytes>",
//!   "registry_path": "valid_licenses.json"
//! }
//! ```
//!
//! Key material is either `encryption_key` or `passphrase` (+ `salt`,
//! `kdf`), never both. A relative `registry_path` is resolved against the
//! directory of the config file.

use crate::engine::EngineConfig;
use crate::error::{LicenseError, LicenseResult};
use crate::registry::RegistrySnapshot;
use keygate_crypto::{DerivedKey, KdfParams, Salt, TokenCipher, derive_key};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Salt used with `passphrase` when none is configured.
pub const DEFAULT_SALT: &str = "keygate_license_salt";

fn default_salt() -> String {
    DEFAULT_SALT.to_string()
}

/// Settings from which an [`EngineConfig`] is built.
#[derive(Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
    #[serde(default = "default_salt")]
    pub salt: String,
    #[serde(default)]
    pub kdf: KdfParams,
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            passphrase: None,
            salt: default_salt(),
            kdf: KdfParams::default(),
            registry_path: None,
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("salt", &self.salt)
            .field("kdf", &self.kdf)
            .field("registry_path", &self.registry_path)
            .finish()
    }
}

impl ValidatorConfig {
    /// Parses a config document.
    pub fn from_json(json: &str) -> LicenseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a config file. A missing file yields the defaults; a file that
    /// exists but cannot be read or parsed is an error.
    pub fn load(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no license config file, using defaults");
            return Ok(Self::default());
        }

        let mut config = Self::from_json(&fs::read_to_string(path)?)?;
        if let (Some(registry), Some(dir)) = (&config.registry_path, path.parent()) {
            if registry.is_relative() {
                config.registry_path = Some(dir.join(registry));
            }
        }
        Ok(config)
    }

    /// Prepares the token key, if any key material is configured.
    pub fn token_key(&self) -> LicenseResult<Option<DerivedKey>> {
        let key = present(&self.encryption_key);
        let passphrase = present(&self.passphrase);
        match (key, passphrase) {
            (Some(_), Some(_)) => Err(LicenseError::InvalidConfig(
                "encryption_key and passphrase are mutually exclusive".into(),
            )),
            (Some(encoded), None) => Ok(Some(DerivedKey::from_base64(encoded)?)),
            (None, Some(passphrase)) => {
                let salt = Salt::from_label(&self.salt)?;
                Ok(Some(derive_key(passphrase, &salt, &self.kdf)?))
            }
            (None, None) => Ok(None),
        }
    }

    /// Builds the engine configuration, reading the registry file if one is
    /// configured. Failures are returned, never downgraded to another mode.
    pub fn into_engine_config(&self) -> LicenseResult<EngineConfig> {
        let mut engine = EngineConfig::new();

        if let Some(key) = self.token_key()? {
            engine = engine.with_decrypt_capability(TokenCipher::new(key));
        }
        if let Some(path) = &self.registry_path {
            let snapshot = RegistrySnapshot::load(path).map_err(|e| {
                LicenseError::InvalidRegistry(format!("{}: {e}", path.display()))
            })?;
            engine = engine.with_registry(snapshot);
        }

        if engine.has_decrypt_capability() && engine.has_registry() {
            info!("registry configured alongside encryption key; encrypted mode takes priority");
        }
        info!(mode = %engine.active_mode(), "license engine configured");
        Ok(engine)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

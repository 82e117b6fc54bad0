//! The validation engine.
//!
//! Mode selection is a pure function of [`EngineConfig`]: a configured
//! decrypt capability selects encrypted mode, otherwise a registry snapshot
//! selects registry mode, otherwise every key is rejected with
//! [`ValidationError::ConfigurationMissing`]. There is no fallback from one
//! mode to the other after a failed decode.
//!
//! After decoding, checks run in a fixed order and the first failure wins:
//! status, expiry, usage quota.

use crate::error::{DecodeError, ValidationError};
use crate::info::{ValidSummary, project};
use crate::record::{EntitlementRecord, LicenseStatus};
use crate::registry::RegistrySnapshot;
use crate::strategy::{DecodeStrategy, DecryptCapability, EncryptedDecode, RegistryLookup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which decode path the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveMode {
    Encrypted,
    Registry,
    None,
}

impl fmt::Display for ActiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypted => write!(f, "encrypted"),
            Self::Registry => write!(f, "registry"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Non-secret description of the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDescription {
    pub active_mode: ActiveMode,
}

/// Capabilities available to the engine.
///
/// Both are shared read-only; cloning a config is cheap.
#[derive(Clone, Default)]
pub struct EngineConfig {
    decrypt_capability: Option<Arc<dyn DecryptCapability>>,
    registry_snapshot: Option<Arc<RegistrySnapshot>>,
}

impl EngineConfig {
    /// A config with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decrypt_capability(self, capability: impl DecryptCapability + 'static) -> Self {
        self.with_shared_decrypt_capability(Arc::new(capability))
    }

    #[must_use]
    pub fn with_shared_decrypt_capability(mut self, capability: Arc<dyn DecryptCapability>) -> Self {
        self.decrypt_capability = Some(capability);
        self
    }

    #[must_use]
    pub fn with_registry(self, snapshot: RegistrySnapshot) -> Self {
        self.with_shared_registry(Arc::new(snapshot))
    }

    #[must_use]
    pub fn with_shared_registry(mut self, snapshot: Arc<RegistrySnapshot>) -> Self {
        self.registry_snapshot = Some(snapshot);
        self
    }

    /// The mode this config selects.
    #[must_use]
    pub fn active_mode(&self) -> ActiveMode {
        if self.decrypt_capability.is_some() {
            ActiveMode::Encrypted
        } else if self.registry_snapshot.is_some() {
            ActiveMode::Registry
        } else {
            ActiveMode::None
        }
    }

    #[must_use]
    pub fn has_decrypt_capability(&self) -> bool {
        self.decrypt_capability.is_some()
    }

    #[must_use]
    pub fn has_registry(&self) -> bool {
        self.registry_snapshot.is_some()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("decrypt_capability", &self.has_decrypt_capability())
            .field(
                "registry_entries",
                &self.registry_snapshot.as_ref().map(|s| s.len()),
            )
            .finish()
    }
}

/// Result of validating one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(EntitlementRecord),
    Invalid(ValidationError),
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The validated record, if any.
    #[must_use]
    pub fn record(&self) -> Option<&EntitlementRecord> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Invalid(_) => None,
        }
    }

    /// The rejection reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<EntitlementRecord, ValidationError> {
        match self {
            Self::Valid(record) => Ok(record),
            Self::Invalid(err) => Err(err),
        }
    }
}

/// Validates license keys against a fixed configuration.
///
/// The engine holds no mutable state and is `Send + Sync`; share one
/// instance behind an `Arc` if several callers need it. Reconfiguring means
/// building a new engine.
///
/// The engine never records a use. Integrators that increment
/// `current_uses` after a successful validation must do so atomically
/// against their store: two concurrent validations can both see
/// `current_uses < max_uses` and both succeed.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: EngineConfig,
}

impl ValidationEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Reports the active mode without exposing any key material.
    #[must_use]
    pub fn describe_config(&self) -> ConfigDescription {
        ConfigDescription {
            active_mode: self.config.active_mode(),
        }
    }

    /// Validates `raw_key` as of `now`. Total: every input yields an outcome.
    pub fn validate(&self, raw_key: &str, now: DateTime<Utc>) -> ValidationOutcome {
        // An empty key is reported as such even without any configured mode.
        if raw_key.trim().is_empty() {
            debug!("rejected empty license key");
            return ValidationOutcome::Invalid(DecodeError::EmptyKey.into());
        }

        let mode = self.config.active_mode();
        let decoded = if let Some(capability) = self.config.decrypt_capability.as_deref() {
            EncryptedDecode::new(capability).decode(raw_key)
        } else if let Some(snapshot) = self.config.registry_snapshot.as_deref() {
            RegistryLookup::new(Some(snapshot)).decode(raw_key)
        } else {
            warn!("license validation attempted with no decode mode configured");
            return ValidationOutcome::Invalid(ValidationError::ConfigurationMissing);
        };

        let outcome = match decoded {
            Ok(record) => evaluate(record, now),
            Err(err) => ValidationOutcome::Invalid(err.into()),
        };

        match &outcome {
            ValidationOutcome::Valid(record) => {
                debug!(%mode, owner = %record.owner_id, "license accepted");
            }
            ValidationOutcome::Invalid(err) if err.is_configuration_error() => {
                warn!(%mode, kind = err.kind(), "license engine misconfigured");
            }
            ValidationOutcome::Invalid(err) => {
                debug!(%mode, kind = err.kind(), "license rejected");
            }
        }
        outcome
    }

    /// Projects a validated record. See [`project`].
    #[must_use]
    pub fn project(&self, record: &EntitlementRecord, now: DateTime<Utc>) -> ValidSummary {
        project(record, now)
    }

    /// Validates and, on success, projects in one call.
    pub fn license_info(
        &self,
        raw_key: &str,
        now: DateTime<Utc>,
    ) -> Result<ValidSummary, ValidationError> {
        let record = self.validate(raw_key, now).into_result()?;
        Ok(project(&record, now))
    }
}

/// Applies business rules to a decoded record.
fn evaluate(record: EntitlementRecord, now: DateTime<Utc>) -> ValidationOutcome {
    if record.status != LicenseStatus::Active {
        return ValidationOutcome::Invalid(ValidationError::Disabled);
    }
    if let Some(expired_at) = record.expire_at.filter(|_| record.is_expired(now)) {
        return ValidationOutcome::Invalid(ValidationError::Expired { expired_at });
    }
    if let Some(max_uses) = record.max_uses.filter(|_| record.is_exhausted()) {
        return ValidationOutcome::Invalid(ValidationError::ExhaustedUses {
            current_uses: record.current_uses,
            max_uses,
        });
    }
    ValidationOutcome::Valid(record)
}

//! Error types for license validation.

use chrono::{DateTime, Utc};
use keygate_crypto::CryptoError;
use thiserror::Error;

/// Failure to turn a raw key into a candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Key is empty or whitespace only.
    #[error("license key is empty")]
    EmptyKey,

    /// Encrypted key did not open, or opened to something that is not a
    /// JSON document. Deliberately does not say which.
    #[error("license key could not be decrypted")]
    BadCiphertext,

    /// Decrypted payload lacks a required field or has a mistyped one.
    #[error("invalid license payload: {0}")]
    MalformedPayload(String),

    /// Registry entry does not have the record shape.
    #[error("invalid registry record: {0}")]
    MalformedRecord(String),

    /// Key is not present in the registry.
    #[error("license key not found")]
    NotFound,

    /// Registry lookup was attempted without a registry.
    #[error("no license registry is configured")]
    MissingStore,
}

/// Why a key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Neither an encrypted capability nor a registry is configured.
    #[error("no license validation mode is configured")]
    ConfigurationMissing,

    /// The key could not be decoded into a record.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Record status is not active.
    #[error("license has been disabled")]
    Disabled,

    /// Record expiry is in the past.
    #[error("license expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// Usage quota reached.
    #[error("license usage exhausted ({current_uses} of {max_uses} uses)")]
    ExhaustedUses { current_uses: u64, max_uses: u64 },
}

impl ValidationError {
    /// Stable snake_case tag for logs and machine-readable output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::Decode(DecodeError::EmptyKey) => "empty_key",
            Self::Decode(DecodeError::BadCiphertext) => "bad_ciphertext",
            Self::Decode(DecodeError::MalformedPayload(_)) => "malformed_payload",
            Self::Decode(DecodeError::MalformedRecord(_)) => "malformed_record",
            Self::Decode(DecodeError::NotFound) => "not_found",
            Self::Decode(DecodeError::MissingStore) => "missing_store",
            Self::Disabled => "disabled",
            Self::Expired { .. } => "expired",
            Self::ExhaustedUses { .. } => "exhausted_uses",
        }
    }

    /// Returns true for failures an operator must fix, as opposed to a bad
    /// or ineligible key presented by a user.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing | Self::Decode(DecodeError::MissingStore)
        )
    }
}

/// Errors from loading configuration, registry files and key material.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// File system error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is inconsistent or incomplete.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registry file content cannot be used.
    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    /// A record cannot be written in wire form.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Key material could not be prepared.
    #[error("key material error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Result type for configuration and registry operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

//! Error types for the key and token layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed. The message never says which stage failed.
    #[error("decryption failed")]
    Decryption,

    /// Key material could not be decoded.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Salt shorter than the KDF accepts.
    #[error("salt too short: need at least {min} bytes, got {actual}")]
    SaltTooShort { min: usize, actual: usize },
}

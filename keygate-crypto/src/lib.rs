//! Key material and token cipher for keygate license keys.
//!
//! Encrypted license keys are self-contained: the key string is a sealed
//! JSON payload, and whoever holds the token key can open it. This crate
//! owns the key handling and the AEAD; it knows nothing about the payload.

mod cipher;
mod error;
mod key;

pub use cipher::{NONCE_SIZE, TAG_SIZE, TokenCipher};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    DerivedKey, KEY_SIZE, KdfParams, MIN_SALT_SIZE, Salt, derive_key, generate_random_key,
};

//! License token sealing with ChaCha20-Poly1305.
//!
//! A token is `base64url(nonce || ciphertext || tag)`, unpadded. Opening
//! accepts padded input too.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Seals and opens license tokens under a single key.
#[derive(Clone, Debug)]
pub struct TokenCipher {
    key: DerivedKey,
}

impl TokenCipher {
    /// Creates a cipher bound to `key`.
    pub fn new(key: DerivedKey) -> Self {
        Self { key }
    }

    /// Encrypts `plaintext` into a token string.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<String> {
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut bytes = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }

    /// Decrypts a token string.
    ///
    /// Malformed base64, short input, a wrong key and tampering all collapse
    /// into [`CryptoError::Decryption`].
    pub fn open(&self, token: &str) -> CryptoResult<Vec<u8>> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim().trim_end_matches('='))
            .map_err(|_| CryptoError::Decryption)?;

        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption);
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let cipher = ChaCha20Poly1305::new(self.key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption)
    }
}

//! Field-level encryption for secrets stored in configuration records.
//!
//! Values are sealed with AES-256-GCM under a fresh random 96-bit nonce and
//! stored as `base64(nonce || ciphertext || tag)`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use zeroize::Zeroizing;

/// Key size for AES-256.
pub const KEY_SIZE: usize = 32;

/// Nonce size for AES-GCM.
pub const NONCE_SIZE: usize = 12;

/// Errors from field encryption.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Malformed ciphertext: {0}")]
    Malformed(String),
}

/// Symmetric cipher for secret fields.
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| CipherError::InvalidKeyEncoding(e.to_string()))?,
        );
        Self::from_key(&key)
    }

    /// Build a cipher from raw key bytes.
    pub fn from_key(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_SIZE {
            return Err(CipherError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt a secret. The empty string stays empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypt a value produced by [`FieldCipher::encrypt`].
    pub fn decrypt(&self, sealed: &str) -> Result<String, CipherError> {
        if sealed.is_empty() {
            return Ok(String::new());
        }

        let raw = STANDARD
            .decode(sealed)
            .map_err(|e| CipherError::Malformed(e.to_string()))?;
        if raw.len() <= NONCE_SIZE {
            return Err(CipherError::Malformed(format!(
                "ciphertext too short ({} bytes)",
                raw.len()
            )));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| CipherError::DecryptionFailed)?,
        );
        String::from_utf8(plaintext.to_vec()).map_err(|e| CipherError::Malformed(e.to_string()))
    }
}

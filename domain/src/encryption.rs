//! AES-256-GCM sealing for values that leave the server, such as session
//! cookies.
//!
//! A sealed value is `base64url(nonce || ciphertext || tag)`. GCM authenticates
//! the ciphertext, so any modification fails to open instead of yielding
//! altered plaintext. The key is 32 bytes, configured as 64 hex characters.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use rand::Rng;
use std::fmt;
use thiserror::Error;

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption operations
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Invalid encryption key: must be 32 bytes (64 hex characters)")]
    InvalidKey,

    #[error("Failed to decode hex key: {0}")]
    HexDecodeError(#[from] hex::FromHexError),

    #[error("Failed to decode base64 ciphertext: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed - data may be corrupted or key is incorrect")]
    DecryptionFailed,

    #[error("Ciphertext too short - missing nonce")]
    CiphertextTooShort,
}

/// A 256-bit AES-GCM key.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Parses a hex-encoded 32-byte key
    pub fn from_hex(key_hex: &str) -> Result<Self, EncryptionError> {
        let bytes = hex::decode(key_hex.trim())?;
        if bytes.len() != KEY_SIZE {
            return Err(EncryptionError::InvalidKey);
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    /// A fresh random key. Anything sealed with it dies with the process.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill(&mut key);
        Self(key)
    }

    fn cipher(&self) -> Result<Aes256Gcm, EncryptionError> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|_| EncryptionError::InvalidKey)
    }

    /// Encrypts `plaintext` under a random nonce and returns the sealed,
    /// base64url-encoded value.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, EncryptionError> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| EncryptionError::EncryptionFailed)?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Verifies and decrypts a value produced by [`EncryptionKey::seal`].
    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, EncryptionError> {
        let cipher = self.cipher()?;
        let combined = BASE64.decode(sealed)?;

        if combined.len() < NONCE_SIZE {
            return Err(EncryptionError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| EncryptionError::DecryptionFailed)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test key: 32 bytes = 64 hex characters
    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn key() -> EncryptionKey {
        EncryptionKey::from_hex(TEST_KEY).expect("valid test key")
    }

    #[test]
    fn test_seal_produces_different_outputs() {
        // Due to random nonce, sealing the same plaintext should produce different values
        let first = key().seal(b"session").unwrap();
        let second = key().seal(b"session").unwrap();

        assert_ne!(first, second);
        assert_eq!(key().open(&first).unwrap(), b"session");
        assert_eq!(key().open(&second).unwrap(), b"session");
    }

    #[test]
    fn test_sealed_value_is_cookie_safe() {
        let sealed = key().seal(&[0xff; 64]).unwrap();
        assert!(sealed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(
            EncryptionKey::from_hex("abcd"),
            Err(EncryptionError::InvalidKey)
        ));
        assert!(matches!(
            EncryptionKey::from_hex("not hex"),
            Err(EncryptionError::HexDecodeError(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let sealed = key().seal(b"secret").unwrap();
        let wrong_key = EncryptionKey::from_hex(&"f".repeat(64)).unwrap();

        assert!(matches!(
            wrong_key.open(&sealed),
            Err(EncryptionError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let sealed = key().seal(b"user-1").unwrap();
        let mut bytes = BASE64.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = BASE64.encode(bytes);

        assert!(matches!(
            key().open(&tampered),
            Err(EncryptionError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_corrupted_encoding_fails() {
        assert!(matches!(
            key().open("not valid base64!!!"),
            Err(EncryptionError::Base64DecodeError(_))
        ));
    }

    #[test]
    fn test_ciphertext_too_short() {
        // Valid base64 but too short to contain nonce
        assert!(matches!(
            key().open("YWJj"),
            Err(EncryptionError::CiphertextTooShort)
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        assert_eq!(format!("{:?}", key()), "EncryptionKey(<redacted>)");
    }
}

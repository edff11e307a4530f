//! Authenticated blob encryption using AES-256-GCM.

use super::CryptoKey;
use crate::error::{StoreError, StoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const HKDF_SALT: &[u8] = b"vmostore-blob-salt";
const HKDF_INFO: &[u8] = b"vmostore-blob-key-v1";

/// Seals blobs with AES-256-GCM.
///
/// Output format: `base64(nonce (12 bytes) || ciphertext || tag (16 bytes))`.
pub struct AeadCipher {
    cipher: Aes256Gcm,
}

impl AeadCipher {
    /// Derives the AES key from the secret with HKDF-SHA256.
    ///
    /// # Errors
    ///
    /// Returns an error if key derivation fails.
    pub fn new(key: &CryptoKey) -> StoreResult<Self> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), key.expose().as_bytes());
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(HKDF_INFO, &mut bytes)
            .map_err(|_| StoreError::encryption("HKDF expand failed"))?;

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&bytes));
        bytes.zeroize();
        Ok(Self { cipher })
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn seal(&self, plaintext: &str) -> StoreResult<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| StoreError::encryption("encryption error"))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend(ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypts text produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed, was sealed under another
    /// key, or was tampered with.
    pub fn open(&self, sealed: &str) -> StoreResult<String> {
        let bytes = STANDARD
            .decode(sealed.as_bytes())
            .map_err(|e| StoreError::decryption(format!("invalid base64: {e}")))?;
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StoreError::decryption("ciphertext too short"));
        }

        let nonce = Nonce::from_slice(&bytes[..NONCE_SIZE]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &bytes[NONCE_SIZE..])
            .map_err(|_| StoreError::decryption("decryption error"))?;
        String::from_utf8(plaintext).map_err(|_| StoreError::decryption("plaintext is not UTF-8"))
    }
}

impl std::fmt::Debug for AeadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadCipher")
            .field("cipher", &"Aes256Gcm")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(secret: &str) -> AeadCipher {
        AeadCipher::new(&CryptoKey::new(secret)).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let c = cipher("1234567812345678");
        let plaintext = r#"{"name":{"v":{"string":"John"},"t":0,"k":false}}"#;
        let sealed = c.seal(plaintext).unwrap();
        assert!(!sealed.contains("John"));
        assert_eq!(c.open(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn encrypt_produces_different_ciphertext() {
        let c = cipher("key");
        assert_ne!(c.seal("same data").unwrap(), c.seal("same data").unwrap());
    }

    #[test]
    fn decrypt_wrong_key_fails() {
        let sealed = cipher("key-one").seal("secret").unwrap();
        assert!(cipher("key-two").open(&sealed).is_err());
    }

    #[test]
    fn decrypt_tampered_fails() {
        let c = cipher("key");
        let mut bytes = STANDARD.decode(c.seal("data").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(c.open(&STANDARD.encode(bytes)).is_err());
    }

    #[test]
    fn decrypt_too_short_fails() {
        let c = cipher("key");
        assert!(c.open(&STANDARD.encode([0u8; 10])).is_err());
    }

    #[test]
    fn empty_plaintext() {
        let c = cipher("key");
        let sealed = c.seal("").unwrap();
        assert_eq!(c.open(&sealed).unwrap(), "");
    }
}

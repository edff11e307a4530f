//! Reversible XOR obfuscation.
//!
//! `seal(text) = reverse(base64(text XOR key))`, where the key bytes are
//! repeated cyclically over the UTF-8 bytes of the text. This is not
//! encryption: anyone holding one sealed blob and its plaintext recovers
//! the key.

use super::CryptoKey;
use crate::error::{StoreError, StoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// The XOR obfuscation transform.
#[derive(Debug)]
pub struct XorCipher {
    key: CryptoKey,
}

impl XorCipher {
    /// Creates the transform for a non-empty key.
    #[must_use]
    pub fn new(key: CryptoKey) -> Self {
        Self { key }
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        let key = self.key.expose().as_bytes();
        if key.is_empty() {
            return data.to_vec();
        }
        data.iter()
            .zip(key.iter().cycle())
            .map(|(byte, k)| byte ^ k)
            .collect()
    }

    /// Obfuscates `plaintext`.
    #[must_use]
    pub fn seal(&self, plaintext: &str) -> String {
        STANDARD
            .encode(self.apply(plaintext.as_bytes()))
            .chars()
            .rev()
            .collect()
    }

    /// Reverses [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns an error if `sealed` is not reversed base64, or does not
    /// decode to UTF-8 under this key.
    pub fn open(&self, sealed: &str) -> StoreResult<String> {
        let encoded: String = sealed.chars().rev().collect();
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| StoreError::decryption(format!("invalid base64: {e}")))?;
        String::from_utf8(self.apply(&bytes))
            .map_err(|_| StoreError::decryption("blob is not valid UTF-8 under this key"))
    }
}

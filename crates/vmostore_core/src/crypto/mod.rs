//! At-rest transforms for persisted blobs.
//!
//! A store configured with a secret passes every blob through a
//! [`Cipher`] before it reaches the backend, and back after reading.
//!
//! ## Modes
//!
//! - [`CipherMode::Xor`] - XOR with the secret, base64, reversed. A
//!   low-assurance obfuscation layer; it hides blobs from casual
//!   inspection and nothing more.
//! - [`CipherMode::Aes256Gcm`] - authenticated encryption with a key
//!   derived from the secret via HKDF-SHA256. Requires the `encryption`
//!   feature.
//!
//! ## Usage
//!
//! ```rust
//! use vmostore_core::crypto::{Cipher, CipherMode, CryptoKey};
//!
//! let cipher = Cipher::new(CryptoKey::new("1234567812345678"), CipherMode::Xor).unwrap();
//! let sealed = cipher.seal(r#"{"a":1}"#).unwrap();
//! assert_eq!(cipher.open(&sealed).unwrap(), r#"{"a":1}"#);
//! ```

#[cfg(feature = "encryption")]
mod aead;
mod xor;

use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use xor::XorCipher;

#[cfg(feature = "encryption")]
pub use aead::AeadCipher;

/// The caller-supplied secret a store's cipher is keyed by.
///
/// The secret is zeroized when dropped and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CryptoKey {
    secret: String,
}

impl CryptoKey {
    /// Wraps a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns the secret.
    ///
    /// # Security
    ///
    /// Be careful with this method - don't log or serialize the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl From<&str> for CryptoKey {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for CryptoKey {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

/// Which transform a keyed store applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMode {
    /// Reversible XOR obfuscation.
    #[default]
    Xor,
    /// AES-256-GCM with an HKDF-SHA256 derived key.
    Aes256Gcm,
}

impl FromStr for CipherMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xor" => Ok(Self::Xor),
            "aes" | "aes-256-gcm" => Ok(Self::Aes256Gcm),
            other => Err(format!("unknown cipher mode: {other}")),
        }
    }
}

/// A blob transform keyed by a [`CryptoKey`].
#[derive(Debug)]
pub enum Cipher {
    /// See [`XorCipher`].
    Xor(XorCipher),
    /// See `AeadCipher`.
    #[cfg(feature = "encryption")]
    Aead(AeadCipher),
}

impl Cipher {
    /// Builds the cipher for `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty, or if AES-256-GCM is
    /// requested without the `encryption` feature.
    pub fn new(key: CryptoKey, mode: CipherMode) -> StoreResult<Self> {
        if key.expose().is_empty() {
            return Err(StoreError::invalid_config("crypto key must not be empty"));
        }
        match mode {
            CipherMode::Xor => Ok(Self::Xor(XorCipher::new(key))),
            #[cfg(feature = "encryption")]
            CipherMode::Aes256Gcm => Ok(Self::Aead(AeadCipher::new(&key)?)),
            #[cfg(not(feature = "encryption"))]
            CipherMode::Aes256Gcm => Err(StoreError::invalid_config(
                "AES-256-GCM requires the `encryption` feature",
            )),
        }
    }

    /// Transforms blob text before it is written.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn seal(&self, plaintext: &str) -> StoreResult<String> {
        match self {
            Self::Xor(cipher) => Ok(cipher.seal(plaintext)),
            #[cfg(feature = "encryption")]
            Self::Aead(cipher) => cipher.seal(plaintext),
        }
    }

    /// Reverses [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns an error if the text was not produced by this cipher and key.
    pub fn open(&self, sealed: &str) -> StoreResult<String> {
        match self {
            Self::Xor(cipher) => cipher.open(sealed),
            #[cfg(feature = "encryption")]
            Self::Aead(cipher) => cipher.open(sealed),
        }
    }
}

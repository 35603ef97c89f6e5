//! Token encryption.
//!
//! Upstream tokens never leave the service in the clear. They are sealed
//! with ChaCha20-Poly1305 under a 32-byte key and returned to callers as
//! `base64(nonce || ciphertext)`. Callers hand the sealed value back on
//! later requests and never see the plaintext.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine as _,
};
use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, ChaCha20Poly1305,
};

/// Errors from sealing or opening tokens.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key must be base64 for 32 bytes")]
    InvalidKey,

    #[error("token is not valid base64")]
    InvalidEncoding,

    #[error("token could not be encrypted")]
    EncryptFailed,

    #[error("token could not be decrypted")]
    DecryptFailed,
}

const NONCE_LEN: usize = 12;

/// Seals and opens tokens under a fixed service key.
#[derive(Clone)]
pub struct TokenCipher {
    cipher: ChaCha20Poly1305,
}

impl TokenCipher {
    /// Builds a cipher from the configured key string.
    ///
    /// The key is base64 (standard or URL-safe alphabet) for exactly 32
    /// bytes.
    pub fn new(key: &str) -> Result<Self, CryptoError> {
        let raw = URL_SAFE
            .decode(key)
            .or_else(|_| STANDARD.decode(key))
            .map_err(|_| CryptoError::InvalidKey)?;

        let cipher =
            ChaCha20Poly1305::new_from_slice(&raw).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Seals a plaintext token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Opens a sealed token.
    pub fn decrypt(&self, sealed: &str) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(sealed)
            .map_err(|_| CryptoError::InvalidEncoding)?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::InvalidEncoding);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(nonce.into(), ciphertext)
            .map_err(|_| CryptoError::DecryptFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 32 zero bytes, URL-safe base64.
    const KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_roundtrip() {
        let cipher = TokenCipher::new(KEY).unwrap();
        let sealed = cipher.encrypt("Atna|access-token").unwrap();
        assert_ne!(sealed, "Atna|access-token");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "Atna|access-token");
    }

    #[test]
    fn test_nonce_varies_per_call() {
        let cipher = TokenCipher::new(KEY).unwrap();
        let a = cipher.encrypt("token").unwrap();
        let b = cipher.encrypt("token").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_token_fails() {
        let cipher = TokenCipher::new(KEY).unwrap();
        let sealed = cipher.encrypt("token").unwrap();

        let mut raw = STANDARD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(CryptoError::DecryptFailed)
        ));
    }

    #[test]
    fn test_rejects_garbage_input() {
        let cipher = TokenCipher::new(KEY).unwrap();
        assert!(cipher.decrypt("not base64!!!").is_err());
        assert!(cipher.decrypt("c2hvcnQ=").is_err());
    }

    #[test]
    fn test_rejects_bad_key() {
        assert!(TokenCipher::new("too-short").is_err());
        assert!(TokenCipher::new("%%%").is_err());
    }
}

//! Payload encryption for the Tuya local protocol.
//!
//! Protocol 3.3 encrypts every payload with AES-128-ECB (PKCS7 padding)
//! under the device's 16-byte local key. Protocol 3.1 only encrypts
//! control payloads and authenticates them with an MD5 slice over the
//! base64 ciphertext and the local key.

use aes::Aes128;
use ecb::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use md5::{Digest, Md5};

use crate::error::Error;

/// Length of a Tuya local key in bytes.
pub const KEY_LEN: usize = 16;

/// Encrypts a payload with AES-128-ECB under the local key.
///
/// # Arguments
///
/// * `key` - The 16-byte local key from device pairing
/// * `plaintext` - The JSON payload bytes
///
/// # Example
///
/// ```
/// use tuya_core::crypto::{encrypt, decrypt};
///
/// let key = b"0123456789abcdef";
/// let ciphertext = encrypt(key, b"{\"dps\":{\"1\":true}}").unwrap();
/// let plaintext = decrypt(key, &ciphertext).unwrap();
/// assert_eq!(plaintext, b"{\"dps\":{\"1\":true}}");
/// ```
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
    let enc = ecb::Encryptor::<Aes128>::new_from_slice(key)
        .map_err(|_| Error::Crypto(format!("local key must be {} bytes", KEY_LEN)))?;
    Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypts an AES-128-ECB payload under the local key.
///
/// Fails when the key has the wrong length, the ciphertext is not
/// block-aligned, or the padding is invalid (which usually means the
/// local key is wrong).
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    let dec = ecb::Decryptor::<Aes128>::new_from_slice(key)
        .map_err(|_| Error::Crypto(format!("local key must be {} bytes", KEY_LEN)))?;
    dec.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Crypto("invalid padding; check that the local key is correct".into()))
}

/// Computes the protocol 3.1 control-payload signature.
///
/// The signature is the middle 16 hex characters of
/// `md5("data=" + base64_payload + "||lpv=3.1||" + key)`.
pub fn sign_v31(key: &[u8], payload_b64: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(b"data=");
    hasher.update(payload_b64.as_bytes());
    hasher.update(b"||lpv=3.1||");
    hasher.update(key);
    let digest = hex::encode(hasher.finalize());
    digest[8..24].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef";

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let payload = br#"{"devId":"abc","dps":{"1":true}}"#;
        let ciphertext = encrypt(KEY, payload).unwrap();
        let plaintext = decrypt(KEY, &ciphertext).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn test_ciphertext_is_block_aligned() {
        let ciphertext = encrypt(KEY, b"x").unwrap();
        assert_eq!(ciphertext.len() % 16, 0);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let ciphertext = encrypt(KEY, b"{\"dps\":{}}").unwrap();
        let result = decrypt(b"fedcba9876543210", &ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(encrypt(b"short", b"payload").is_err());
        assert!(decrypt(b"short", &[0u8; 16]).is_err());
    }

    #[test]
    fn test_sign_v31_is_16_hex_chars() {
        let sig = sign_v31(KEY, "c29tZSBwYXlsb2Fk");
        assert_eq!(sig.len(), 16);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sign_v31_depends_on_key() {
        let a = sign_v31(KEY, "cGF5bG9hZA==");
        let b = sign_v31(b"fedcba9876543210", "cGF5bG9hZA==");
        assert_ne!(a, b);
    }
}

//! Session-keyed authenticated encryption (outermost message layer).
//!
//! This is the only layer in the chain with an integrity guarantee. Keys are
//! derived per call from the session password with scrypt over a fresh
//! random salt, so encrypting the same plaintext twice never yields the same
//! envelope. The cipher is AES-256-GCM with a fresh random nonce and no
//! associated data.
//!
//! Envelope layout, base64-encoded for transport and storage:
//!
//! ```text
//! salt (16 bytes) || nonce (12 bytes) || ciphertext + tag (16 bytes)
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::Params;
use thiserror::Error;
use zeroize::Zeroizing;

/// Salt length prepended to every envelope.
pub const SALT_SIZE: usize = 16;

/// AES-GCM nonce length.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Minimum decodable envelope: salt + nonce + tag of an empty plaintext.
const MIN_ENVELOPE_SIZE: usize = SALT_SIZE + NONCE_SIZE + TAG_SIZE;

/// scrypt cost parameter (N = 2^14).
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const KEY_SIZE: usize = 32;

/// Errors that can occur during session encryption.
#[derive(Error, Debug)]
pub enum SessionCipherError {
    /// Envelope is not valid base64.
    #[error("Invalid envelope encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// Envelope is too short to contain salt, nonce, and tag.
    #[error("Envelope too short: {0} bytes")]
    EnvelopeTooShort(usize),

    /// Wrong session password or tampered envelope.
    #[error("Authentication failed: wrong session password or corrupted data")]
    AuthenticationFailed,

    /// Key derivation failed.
    #[error("Key derivation failed")]
    KeyDerivationFailed,

    /// Encryption itself failed.
    #[error("Encryption failed")]
    EncryptionFailed,
}

/// Password-keyed session cipher for one conversation.
///
/// The password is held zeroized-on-drop; every encrypt call derives a fresh
/// key from a fresh salt, so the struct carries no long-lived key material.
pub struct SessionCipher {
    password: Zeroizing<Vec<u8>>,
}

impl SessionCipher {
    /// Creates a cipher bound to the shared session password.
    pub fn new(password: &str) -> Self {
        Self {
            password: Zeroizing::new(password.as_bytes().to_vec()),
        }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<Key<Aes256Gcm>, SessionCipherError> {
        let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_SIZE)
            .map_err(|_| SessionCipherError::KeyDerivationFailed)?;
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        scrypt::scrypt(&self.password, salt, &params, &mut *key)
            .map_err(|_| SessionCipherError::KeyDerivationFailed)?;
        Ok(*Key::<Aes256Gcm>::from_slice(&*key))
    }

    /// Encrypts `plaintext` into a base64 envelope string.
    ///
    /// Salt and nonce are freshly random per call and never reused.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, SessionCipherError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let key = self.derive_key(&salt)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new(&key);
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| SessionCipherError::EncryptionFailed)?;

        let mut envelope = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(envelope))
    }

    /// Decrypts a base64 envelope string.
    ///
    /// Any bit flip in the envelope, and any wrong password, surfaces as
    /// [`SessionCipherError::AuthenticationFailed`]; partially decrypted
    /// data is never returned.
    pub fn decrypt(&self, envelope: &str) -> Result<Vec<u8>, SessionCipherError> {
        let combined = BASE64.decode(envelope.trim())?;
        if combined.len() < MIN_ENVELOPE_SIZE {
            return Err(SessionCipherError::EnvelopeTooShort(combined.len()));
        }

        let salt = &combined[..SALT_SIZE];
        let nonce = Nonce::from_slice(&combined[SALT_SIZE..SALT_SIZE + NONCE_SIZE]);
        let ciphertext = &combined[SALT_SIZE + NONCE_SIZE..];

        let key = self.derive_key(salt)?;
        let cipher = Aes256Gcm::new(&key);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SessionCipherError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = SessionCipher::new("shared session password");
        let plaintext = b"Hello, MistChat!";

        let envelope = cipher.encrypt(plaintext).unwrap();
        let decrypted = cipher.decrypt(&envelope).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_password_fails() {
        let envelope = SessionCipher::new("correct").encrypt(b"secret").unwrap();
        let result = SessionCipher::new("wrong").decrypt(&envelope);

        assert!(matches!(result, Err(SessionCipherError::AuthenticationFailed)));
    }

    #[test]
    fn test_envelopes_never_repeat() {
        let cipher = SessionCipher::new("pw");
        let a = cipher.encrypt(b"same plaintext").unwrap();
        let b = cipher.encrypt(b"same plaintext").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_flipped_ciphertext_byte_rejected() {
        let cipher = SessionCipher::new("pw");
        let envelope = cipher.encrypt(b"integrity matters").unwrap();

        let mut raw = BASE64.decode(&envelope).unwrap();
        let idx = SALT_SIZE + NONCE_SIZE; // first ciphertext byte
        raw[idx] ^= 0x01;
        let tampered = BASE64.encode(raw);

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(SessionCipherError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let cipher = SessionCipher::new("pw");
        let short = BASE64.encode([0u8; MIN_ENVELOPE_SIZE - 1]);

        assert!(matches!(
            cipher.decrypt(&short),
            Err(SessionCipherError::EnvelopeTooShort(_))
        ));
    }

    #[test]
    fn test_garbage_envelope_rejected() {
        let cipher = SessionCipher::new("pw");
        assert!(matches!(
            cipher.decrypt("%%% not base64 %%%"),
            Err(SessionCipherError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let cipher = SessionCipher::new("pw");
        let envelope = cipher.encrypt(b"").unwrap();
        assert_eq!(cipher.decrypt(&envelope).unwrap(), b"");
    }
}

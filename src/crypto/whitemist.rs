//! White-Mist keyed string cipher (middle message layer).
//!
//! A deterministic keystream cipher over strings: the user key is expanded
//! with HKDF-SHA256 (salted and tagged by two fixed process-wide constants)
//! into a ChaCha20 keystream seed, the UTF-8 bytes of the payload are XORed
//! with that keystream, and the result is base64-encoded so the ciphertext
//! is itself a string.
//!
//! The layer provides obfuscation, not integrity: a wrong key fails the
//! UTF-8 check on decrypt with overwhelming probability, but nothing here
//! detects tampering. The session layer above it carries the authentication
//! guarantee.
//!
//! Two framing modes wrap the cipher (see [`encrypt_payload`]): chat text is
//! encrypted as the string it already is, while raw file bytes are wrapped
//! in base64 first. Decrypting in file mode falls back to returning the
//! decrypted string's UTF-8 bytes when the base64 unwrap fails, which
//! recovers payloads produced before the binary framing existed.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use thiserror::Error;

/// Fixed keystream salt, identical on both ends. Not a secret.
pub const WHITEMIST_SALT: &str = "Kriptoasik";

/// Fixed keystream info tag, identical on both ends. Not a secret.
pub const WHITEMIST_SUGAR: &str = "FunKripto";

/// Errors that can occur inside the White-Mist layer.
#[derive(Error, Debug)]
pub enum WhitemistError {
    /// Ciphertext is not valid base64.
    #[error("Invalid ciphertext encoding: {0}")]
    InvalidCiphertext(#[from] base64::DecodeError),

    /// Decrypted bytes are not valid UTF-8 (usually a wrong key).
    #[error("Decryption produced non-text output (wrong key?)")]
    NotText,

    /// Payload handed to text-mode encryption was not valid UTF-8.
    #[error("Text-mode payload is not valid UTF-8")]
    PayloadNotText,

    /// Keystream seed derivation failed.
    #[error("Key derivation failed")]
    KeyDerivationFailed,
}

/// White-Mist cipher state for one key.
///
/// Construction is cheap; the pipeline builds one per call, mirroring how
/// the two ends must derive identical keystreams from key + constants alone.
pub struct Whitemist {
    seed: [u8; 32],
}

impl Whitemist {
    /// Creates a cipher for `key` with explicit constants.
    pub fn new(key: &str, salt: &str, sugar: &str) -> Result<Self, WhitemistError> {
        let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), key.as_bytes());
        let mut seed = [0u8; 32];
        hk.expand(sugar.as_bytes(), &mut seed)
            .map_err(|_| WhitemistError::KeyDerivationFailed)?;
        Ok(Self { seed })
    }

    /// Creates a cipher for `key` with the process-wide constants.
    pub fn with_defaults(key: &str) -> Result<Self, WhitemistError> {
        Self::new(key, WHITEMIST_SALT, WHITEMIST_SUGAR)
    }

    fn keystream(&self, len: usize) -> Vec<u8> {
        let mut rng = ChaCha20Rng::from_seed(self.seed);
        let mut stream = vec![0u8; len];
        rng.fill_bytes(&mut stream);
        stream
    }

    /// Encrypts a string, producing a base64 ciphertext string.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut bytes = plaintext.as_bytes().to_vec();
        for (b, k) in bytes.iter_mut().zip(self.keystream(plaintext.len())) {
            *b ^= k;
        }
        BASE64.encode(bytes)
    }

    /// Decrypts a base64 ciphertext string back into the original string.
    ///
    /// Fails on malformed base64 or when the XOR output is not UTF-8, which
    /// is the common symptom of a wrong key.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, WhitemistError> {
        let mut bytes = BASE64.decode(ciphertext)?;
        let stream = self.keystream(bytes.len());
        for (b, k) in bytes.iter_mut().zip(stream) {
            *b ^= k;
        }
        String::from_utf8(bytes).map_err(|_| WhitemistError::NotText)
    }
}

/// Encrypts upstream bytes under the framing policy.
///
/// `is_text` declares chat text: the bytes are decoded as UTF-8 and
/// encrypted directly. File bytes (`is_text = false`) are base64-wrapped
/// into an ASCII string first.
pub fn encrypt_payload(data: &[u8], key: &str, is_text: bool) -> Result<String, WhitemistError> {
    let cipher = Whitemist::with_defaults(key)?;
    let string_to_encrypt = if is_text {
        std::str::from_utf8(data)
            .map_err(|_| WhitemistError::PayloadNotText)?
            .to_string()
    } else {
        BASE64.encode(data)
    };
    Ok(cipher.encrypt(&string_to_encrypt))
}

/// Decrypts a ciphertext string back into upstream bytes, mirroring
/// [`encrypt_payload`]'s framing.
///
/// In file mode, a base64 unwrap failure of the decrypted string is not an
/// error: the string's own UTF-8 bytes are returned instead. Payloads from
/// the protocol revision that predates binary framing decrypt to plain text
/// and land here.
pub fn decrypt_payload(
    ciphertext: &str,
    key: &str,
    is_text: bool,
) -> Result<Vec<u8>, WhitemistError> {
    let cipher = Whitemist::with_defaults(key)?;
    let decrypted = cipher.decrypt(ciphertext)?;

    if is_text {
        return Ok(decrypted.into_bytes());
    }

    match BASE64.decode(&decrypted) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(decrypted.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let cipher = Whitemist::with_defaults("kunci").unwrap();
        let encrypted = cipher.encrypt("pesan rahasia");
        assert_ne!(encrypted, "pesan rahasia");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "pesan rahasia");
    }

    #[test]
    fn test_deterministic_for_same_key() {
        let a = Whitemist::with_defaults("k").unwrap().encrypt("same input");
        let b = Whitemist::with_defaults("k").unwrap().encrypt("same input");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_key_different_ciphertext() {
        let a = Whitemist::with_defaults("alpha").unwrap().encrypt("payload");
        let b = Whitemist::with_defaults("bravo").unwrap().encrypt("payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_does_not_silently_succeed() {
        let encrypted = Whitemist::with_defaults("right")
            .unwrap()
            .encrypt("a reasonably long plaintext so a wrong keystream cannot stay valid text");
        let result = Whitemist::with_defaults("wrong").unwrap().decrypt(&encrypted);
        match result {
            Err(WhitemistError::NotText) => {}
            Ok(text) => assert_ne!(
                text,
                "a reasonably long plaintext so a wrong keystream cannot stay valid text"
            ),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_constants_matter() {
        let standard = Whitemist::with_defaults("k").unwrap().encrypt("x");
        let other = Whitemist::new("k", "other-salt", "other-sugar")
            .unwrap()
            .encrypt("x");
        assert_ne!(standard, other);
    }

    #[test]
    fn test_text_framing_roundtrip() {
        let payload = "teks vigenere".as_bytes();
        let encrypted = encrypt_payload(payload, "kunci", true).unwrap();
        let decrypted = decrypt_payload(&encrypted, "kunci", true).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn test_binary_framing_roundtrip() {
        let payload: Vec<u8> = (0u16..600).map(|i| (i % 251) as u8).collect();
        let encrypted = encrypt_payload(&payload, "kunci", false).unwrap();
        let decrypted = decrypt_payload(&encrypted, "kunci", false).unwrap();
        assert_eq!(decrypted, payload);
    }

    #[test]
    fn test_binary_mode_falls_back_to_text_bytes() {
        // A payload encrypted in text mode whose content is not base64:
        // decrypting it in file mode must recover the raw UTF-8 bytes
        // rather than fail the unwrap.
        let legacy = "ini pesan teks lama, bukan base64!";
        let encrypted = encrypt_payload(legacy.as_bytes(), "kunci", true).unwrap();
        let decrypted = decrypt_payload(&encrypted, "kunci", false).unwrap();
        assert_eq!(decrypted, legacy.as_bytes());
    }

    #[test]
    fn test_malformed_ciphertext_rejected() {
        let cipher = Whitemist::with_defaults("k").unwrap();
        assert!(matches!(
            cipher.decrypt("not base64 at all!!!"),
            Err(WhitemistError::InvalidCiphertext(_))
        ));
    }
}

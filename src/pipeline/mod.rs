//! Layered message pipeline.
//!
//! Outgoing text passes through three layers in order:
//!
//! ```text
//! plaintext -> substitution (key) -> White-Mist (key, text framing)
//!           -> session AEAD (session password) -> envelope string
//! ```
//!
//! Receive reverses the chain. The session layer is the only trustworthy
//! error signal: its authentication failure means a wrong session password
//! or corrupted transport and is surfaced hard. Inner-layer failures almost
//! always mean the human typed the wrong per-message key, which is routine —
//! the chain never hard-fails past layer 3. When White-Mist cannot decrypt,
//! the still-encrypted string is carried forward unchanged and the
//! substitution decode is applied anyway, and the result is tagged
//! [`TextDecryption::Degraded`] so callers can mark it instead of showing
//! garbled text as if it were genuine.

pub mod file;

use thiserror::Error;

use crate::crypto::aead::{SessionCipher, SessionCipherError};
use crate::crypto::vigenere;
use crate::crypto::whitemist::{self, WhitemistError};

pub use file::{decrypt_file, encrypt_file, FileCipher};

/// Key substituted when the user submits an empty per-message key.
///
/// The guard lives here, not in the cipher: the substitution cipher stays
/// pure, and every caller that goes through the pipeline gets the same
/// default.
pub const DEFAULT_LAYER_KEY: &str = "defaultkey";

/// Errors that can escape the pipeline.
///
/// Only session-layer failures and malformed sender payloads land here;
/// inner-layer trouble degrades instead (see [`TextDecryption`]).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Session AEAD failure: wrong session password or corrupted envelope.
    #[error(transparent)]
    Session(#[from] SessionCipherError),

    /// White-Mist failed while encrypting (never degraded on send).
    #[error(transparent)]
    Whitemist(#[from] WhitemistError),

    /// Authenticated payload is not the UTF-8 string layer 2 produces.
    /// The AEAD already vouched for integrity, so this is a sender bug.
    #[error("Authenticated payload is not valid UTF-8")]
    MalformedPayload,
}

/// Outcome of a receive-path decryption.
///
/// `Clean` means every layer reversed; `Degraded` means White-Mist failed
/// (wrong per-message key or a pre-framing payload) and the text is the
/// substitution decode of the still-encrypted intermediate — available but
/// likely garbled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextDecryption {
    /// All three layers reversed successfully.
    Clean(String),
    /// Layer 2 was bypassed; best-effort output.
    Degraded(String),
}

impl TextDecryption {
    /// The decrypted text, clean or not.
    pub fn text(&self) -> &str {
        match self {
            Self::Clean(t) | Self::Degraded(t) => t,
        }
    }

    /// Consumes the outcome, returning the text.
    pub fn into_text(self) -> String {
        match self {
            Self::Clean(t) | Self::Degraded(t) => t,
        }
    }

    /// True when an inner layer was bypassed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Returns the caller's key, or the pipeline default when it is empty.
pub fn effective_key(key: &str) -> &str {
    if key.is_empty() {
        DEFAULT_LAYER_KEY
    } else {
        key
    }
}

/// Encrypts chat text through all three layers.
///
/// Returns the base64 envelope string stored as the message body.
pub fn encrypt_text(
    plaintext: &str,
    layer_key: &str,
    session: &SessionCipher,
) -> Result<String, PipelineError> {
    let key = effective_key(layer_key);

    let substituted = vigenere::encode(plaintext, key);
    let misted = whitemist::encrypt_payload(substituted.as_bytes(), key, true)?;
    let envelope = session.encrypt(misted.as_bytes())?;

    Ok(envelope)
}

/// Decrypts a message envelope back into chat text.
///
/// Fails only on session-layer authentication (wrong session password,
/// tampered envelope) or a malformed authenticated payload. A White-Mist
/// failure of any kind degrades: the substitution decode still runs over
/// the unchanged intermediate and the result is tagged `Degraded`.
pub fn decrypt_text(
    envelope: &str,
    layer_key: &str,
    session: &SessionCipher,
) -> Result<TextDecryption, PipelineError> {
    let key = effective_key(layer_key);

    let misted_bytes = session.decrypt(envelope)?;
    let misted =
        String::from_utf8(misted_bytes).map_err(|_| PipelineError::MalformedPayload)?;

    match whitemist::decrypt_payload(&misted, key, true) {
        Ok(substituted_bytes) => {
            // Text framing always yields UTF-8; the lossless conversion is a
            // formality here.
            let substituted = String::from_utf8_lossy(&substituted_bytes);
            Ok(TextDecryption::Clean(vigenere::decode(&substituted, key)))
        }
        Err(_) => Ok(TextDecryption::Degraded(vigenere::decode(&misted, key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionCipher {
        SessionCipher::new("session password")
    }

    #[test]
    fn test_full_roundtrip() {
        let s = session();
        let envelope = encrypt_text("hello world", "key1", &s).unwrap();
        let result = decrypt_text(&envelope, "key1", &s).unwrap();

        assert_eq!(result, TextDecryption::Clean("hello world".to_string()));
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_roundtrip_unicode() {
        let s = session();
        let envelope = encrypt_text("halo dunia — résumé ✓", "kunci", &s).unwrap();
        let result = decrypt_text(&envelope, "kunci", &s).unwrap();
        assert_eq!(result.text(), "halo dunia — résumé ✓");
    }

    #[test]
    fn test_empty_key_uses_default() {
        let s = session();
        let envelope = encrypt_text("plain", "", &s).unwrap();

        // The default key, spelled out, must open what the empty key sealed.
        let result = decrypt_text(&envelope, DEFAULT_LAYER_KEY, &s).unwrap();
        assert_eq!(result, TextDecryption::Clean("plain".to_string()));
    }

    #[test]
    fn test_wrong_session_password_is_hard_failure() {
        let envelope = encrypt_text("secret", "k", &session()).unwrap();
        let wrong = SessionCipher::new("another password");

        assert!(matches!(
            decrypt_text(&envelope, "k", &wrong),
            Err(PipelineError::Session(SessionCipherError::AuthenticationFailed))
        ));
    }

    #[test]
    fn test_wrong_layer_key_never_raises() {
        let s = session();
        let envelope = encrypt_text(
            "a longer secret message so wrong-key output cannot collide",
            "right",
            &s,
        )
        .unwrap();

        let result = decrypt_text(&envelope, "wrong", &s).unwrap();
        assert_ne!(
            result.text(),
            "a longer secret message so wrong-key output cannot collide"
        );
        assert!(!result.text().is_empty());
    }

    #[test]
    fn test_payload_that_skipped_layer_two_degrades() {
        // An envelope whose authenticated payload was never White-Mist
        // encrypted: spaces and '!' keep it out of the base64 alphabet, so
        // layer 2 fails deterministically and the composer degrades.
        let s = session();
        let intermediate = vigenere::encode("pesan tanpa lapisan dua!", "k");
        let envelope = s.encrypt(intermediate.as_bytes()).unwrap();

        let result = decrypt_text(&envelope, "k", &s).unwrap();
        assert!(result.is_degraded());
        assert_eq!(result.text(), "pesan tanpa lapisan dua!");
    }

    #[test]
    fn test_degraded_text_accessors() {
        let degraded = TextDecryption::Degraded("garbled".to_string());
        assert!(degraded.is_degraded());
        assert_eq!(degraded.text(), "garbled");
        assert_eq!(degraded.into_text(), "garbled");
    }
}

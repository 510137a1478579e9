//! File-content pipeline.
//!
//! Files are encrypted with exactly one cipher, chosen by the sender:
//! either the session AEAD run directly over the raw bytes, or White-Mist
//! in binary framing. The substitution layer never applies to files, and
//! the two methods are never stacked. The chosen method travels with the
//! file metadata so the receiver selects the matching inverse.

use serde::{Deserialize, Serialize};

use crate::crypto::aead::SessionCipher;
use crate::crypto::whitemist;
use crate::pipeline::PipelineError;

/// Cipher applied to a file's raw bytes. Mutually exclusive per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCipher {
    /// scrypt + AES-256-GCM envelope over the raw bytes.
    Aes,
    /// White-Mist with binary (base64-wrapped) framing.
    Whitemist,
}

impl std::fmt::Display for FileCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes => write!(f, "aes"),
            Self::Whitemist => write!(f, "whitemist"),
        }
    }
}

/// Encrypts raw file bytes with the selected cipher.
///
/// The output is what gets uploaded: envelope text for `Aes`, White-Mist
/// ciphertext for `Whitemist`, both as UTF-8 bytes.
pub fn encrypt_file(
    data: &[u8],
    key: &str,
    method: FileCipher,
) -> Result<Vec<u8>, PipelineError> {
    match method {
        FileCipher::Aes => {
            let envelope = SessionCipher::new(key).encrypt(data)?;
            Ok(envelope.into_bytes())
        }
        FileCipher::Whitemist => {
            let encrypted = whitemist::encrypt_payload(data, key, false)?;
            Ok(encrypted.into_bytes())
        }
    }
}

/// Decrypts downloaded file bytes with the inverse selected by `method`.
pub fn decrypt_file(
    data: &[u8],
    key: &str,
    method: FileCipher,
) -> Result<Vec<u8>, PipelineError> {
    let text = std::str::from_utf8(data).map_err(|_| PipelineError::MalformedPayload)?;
    match method {
        FileCipher::Aes => Ok(SessionCipher::new(key).decrypt(text)?),
        FileCipher::Whitemist => Ok(whitemist::decrypt_payload(text, key, false)?),
    }
}

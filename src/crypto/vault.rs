//! Config vault: AEAD for the locally stored USB token list.
//!
//! A second, independent AEAD instance, unrelated to the chat session
//! cipher: PBKDF2-HMAC-SHA256 (100 000 iterations, 32-byte key) feeding
//! AES-256-GCM. The sealed record is a JSON object with hex fields,
//!
//! ```json
//! {"salt": "…", "nonce": "…", "tag": "…", "ciphertext": "…"}
//! ```
//!
//! with the 16-byte GCM tag carried separately from the ciphertext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;
const ITERATIONS: u32 = 100_000;

/// Errors that can occur sealing or opening a vault record.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Record is not valid JSON.
    #[error("Invalid vault record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    /// A hex field in the record is malformed.
    #[error("Invalid hex field in vault record: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Nonce field has the wrong length.
    #[error("Invalid nonce length: {0} bytes")]
    InvalidNonce(usize),

    /// Wrong password or tampered record.
    #[error("Vault authentication failed: wrong password or corrupted record")]
    AuthenticationFailed,

    /// Sealed plaintext was not valid UTF-8.
    #[error("Vault plaintext is not valid UTF-8")]
    NotText,

    /// Encryption itself failed.
    #[error("Vault sealing failed")]
    SealFailed,
}

#[derive(Serialize, Deserialize)]
struct VaultRecord {
    salt: String,
    nonce: String,
    tag: String,
    ciphertext: String,
}

fn derive_key(password: &str, salt: &[u8]) -> Key<Aes256Gcm> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ITERATIONS, &mut *key);
    *Key::<Aes256Gcm>::from_slice(&*key)
}

/// Seals `plaintext` under `password` into JSON record bytes.
pub fn seal(plaintext: &str, password: &str) -> Result<Vec<u8>, VaultError> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new(&derive_key(password, &salt));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|_| VaultError::SealFailed)?;

    // GCM output is ciphertext followed by the tag; the record stores them
    // as separate fields.
    let split = sealed.len() - TAG_SIZE;
    let record = VaultRecord {
        salt: hex::encode(salt),
        nonce: hex::encode(nonce_bytes),
        tag: hex::encode(&sealed[split..]),
        ciphertext: hex::encode(&sealed[..split]),
    };

    Ok(serde_json::to_vec(&record)?)
}

/// Opens JSON record bytes sealed by [`seal`].
pub fn open(data: &[u8], password: &str) -> Result<String, VaultError> {
    let record: VaultRecord = serde_json::from_slice(data)?;

    let salt = hex::decode(&record.salt)?;
    let nonce = hex::decode(&record.nonce)?;
    let tag = hex::decode(&record.tag)?;
    let ciphertext = hex::decode(&record.ciphertext)?;

    if nonce.len() != NONCE_SIZE {
        return Err(VaultError::InvalidNonce(nonce.len()));
    }

    let mut combined = ciphertext;
    combined.extend_from_slice(&tag);

    let cipher = Aes256Gcm::new(&derive_key(password, &salt));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), combined.as_slice())
        .map_err(|_| VaultError::AuthenticationFailed)?;

    String::from_utf8(plaintext).map_err(|_| VaultError::NotText)
}

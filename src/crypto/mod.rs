//! Cryptographic layers for MistChat.
//!
//! This module provides the three message layers plus the two auxiliary
//! password schemes:
//! - Keyed substitution cipher (layer 1, innermost)
//! - White-Mist keyed string cipher with text/binary framing (layer 2)
//! - Session AEAD: scrypt-derived AES-256-GCM envelopes (layer 3, outermost)
//! - Account password hashing (PBKDF2 salt/hash pairs for the remote store)
//! - Config vault (independent AEAD for the local USB token list)
//!
//! Layer composition and the degradation policy live in [`crate::pipeline`].

pub mod aead;
pub mod password;
pub mod vault;
pub mod vigenere;
pub mod whitemist;

pub use aead::{SessionCipher, SessionCipherError};
pub use password::{hash_password, verify_password};
pub use vault::{open as vault_open, seal as vault_seal, VaultError};
pub use whitemist::{
    decrypt_payload, encrypt_payload, Whitemist, WhitemistError, WHITEMIST_SALT, WHITEMIST_SUGAR,
};

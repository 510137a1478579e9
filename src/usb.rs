//! USB token gating.
//!
//! The application can require a registered USB token to be mounted before
//! it unlocks. Registered token values live in a local config file sealed
//! by the config vault ([`crate::crypto::vault`]); a token drive is any
//! mount point carrying a `.mistchat_key` file whose trimmed contents match
//! a registered value.
//!
//! Enumerating the platform's removable drives is the caller's concern —
//! the functions here take candidate mount points and only do the matching.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::vault::{self, VaultError};

/// Key file looked up on each candidate mount point.
pub const TOKEN_FILE: &str = ".mistchat_key";

/// Built-in registry master secret, used when the operator does not supply
/// one. It only protects the local token list against casual reads; the
/// tokens gate presence, they are not encryption keys.
pub const DEFAULT_MASTER_SECRET: &str = "ini-adalah-kunci-rahasia-saya-yang-sangat-panjang-12345";

/// Errors that can occur managing the token registry.
#[derive(Error, Debug)]
pub enum UsbError {
    /// Registry file I/O failure.
    #[error("Token registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry could not be unsealed or parsed.
    #[error("Token registry unreadable: {0}")]
    Vault(#[from] VaultError),

    /// Registry content was not a list of token strings.
    #[error("Token registry corrupt")]
    Corrupt,
}

/// List of registered token values, sealed at rest.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: Vec<String>,
}

impl TokenRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and unseals the registry file.
    ///
    /// A missing file yields an empty registry; a present-but-unreadable
    /// file is an error, so a tampered registry cannot silently disable
    /// gating.
    pub fn load(path: &Path, master_secret: &str) -> Result<Self, UsbError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let sealed = fs::read(path)?;
        let json = vault::open(&sealed, master_secret)?;
        let tokens: Vec<String> = serde_json::from_str(&json).map_err(|_| UsbError::Corrupt)?;
        debug!(count = tokens.len(), "token registry loaded");
        Ok(Self { tokens })
    }

    /// Seals and writes the registry.
    pub fn save(&self, path: &Path, master_secret: &str) -> Result<(), UsbError> {
        let json = serde_json::to_string(&self.tokens).map_err(|_| UsbError::Corrupt)?;
        let sealed = vault::seal(&json, master_secret)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, sealed)?;
        Ok(())
    }

    /// Registers a token value, ignoring duplicates.
    pub fn register(&mut self, token: &str) {
        let token = token.trim();
        if !token.is_empty() && !self.tokens.iter().any(|t| t == token) {
            self.tokens.push(token.to_string());
        }
    }

    /// True when the value matches a registered token.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token.trim())
    }

    /// Number of registered tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when no token is registered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Finds the first mount point carrying a registered token.
pub fn find_token_drive(mounts: &[PathBuf], registry: &TokenRegistry) -> Option<PathBuf> {
    for mount in mounts {
        let key_path = mount.join(TOKEN_FILE);
        let value = match fs::read_to_string(&key_path) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if registry.contains(&value) {
            debug!(mount = %mount.display(), "matching token found");
            return Some(mount.clone());
        }
        warn!(mount = %mount.display(), "token present but not registered");
    }
    None
}

/// True when any candidate mount carries a registered token.
pub fn token_present(mounts: &[PathBuf], registry: &TokenRegistry) -> bool {
    find_token_drive(mounts, registry).is_some()
}

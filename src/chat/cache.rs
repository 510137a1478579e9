//! Local display cache for decrypted message content.
//!
//! Stored message records are immutable; decrypting one only updates this
//! per-user JSON file so the text can be shown again without asking for the
//! key. Entries are keyed by a stable message id: the SHA-256 of the
//! envelope for text messages, the store's file id otherwise.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::client::models::{Message, MessageKind};

/// One cached display entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Decrypted (or revealed) display text.
    pub text: String,
    /// Local path of the downloaded carrier image, for stegano messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    /// True when the text came out of a degraded decryption.
    #[serde(default)]
    pub degraded: bool,
}

impl CacheEntry {
    /// Plain text entry.
    pub fn text(text: String, degraded: bool) -> Self {
        Self {
            text,
            image_path: None,
            degraded,
        }
    }
}

/// Stable cache id for a message, if it has one.
pub fn message_id(message: &Message) -> Option<String> {
    match message.kind {
        MessageKind::Text => message.data.as_ref().map(|data| {
            let digest = Sha256::digest(data.as_bytes());
            hex::encode(digest)
        }),
        MessageKind::File | MessageKind::Stegano => message.file_id.clone(),
    }
}

/// Per-user display cache backed by one JSON file.
pub struct DisplayCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl DisplayCache {
    /// Opens the cache file, starting empty when it is missing or corrupt.
    /// A corrupt cache only costs re-decryption, never an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "display cache corrupt, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Looks up the cached entry for a message id.
    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// Inserts an entry and persists the cache.
    pub fn put(&mut self, id: String, entry: CacheEntry) -> io::Result<()> {
        self.entries.insert(id, entry);
        self.persist()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, json)
    }
}

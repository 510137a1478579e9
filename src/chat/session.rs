//! Chat session orchestration.
//!
//! A [`ChatSession`] binds one user/peer pair to the remote store: it owns
//! the session cipher, routes outgoing content through the pipeline, and
//! keeps the local display cache in step with what the user has decrypted.
//!
//! The session password is derived deterministically from the sorted
//! username pair. That makes the two ends agree without a handshake, and it
//! also means anyone who knows both usernames can derive it — the scheme is
//! not cryptographically sound and a real key exchange is the correct fix;
//! it is kept for compatibility with deployed peers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chat::cache::{message_id, CacheEntry, DisplayCache};
use crate::chat::error::ChatError;
use crate::client::models::{Message, MessageKind};
use crate::client::ApiClient;
use crate::crypto::aead::SessionCipher;
use crate::pipeline::{self, FileCipher, TextDecryption};
use crate::stego;

/// Upload size limit enforced before encryption.
pub const MAX_FILE_SIZE: usize = 2 * 1024 * 1024;

/// Canonical chat id for a user pair: the sorted usernames joined by `_`.
pub fn chat_id(user_a: &str, user_b: &str) -> String {
    let (first, second) = sorted_pair(user_a, user_b);
    format!("{first}_{second}")
}

/// Deterministic shared session password for a user pair.
///
/// Derived from the sorted usernames alone; see the module docs for why
/// this is weak.
pub fn derive_session_password(user_a: &str, user_b: &str) -> String {
    let (first, second) = sorted_pair(user_a, user_b);
    format!("key_rahasia_{first}_{second}")
}

fn sorted_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One active conversation.
pub struct ChatSession {
    current_user: String,
    peer: String,
    chat_id: String,
    session: SessionCipher,
    api: ApiClient,
    cache: DisplayCache,
    media_dir: PathBuf,
}

impl ChatSession {
    /// Opens a session between `current_user` and `peer`.
    ///
    /// `data_dir` holds the per-user display cache and downloaded media.
    pub fn open(
        current_user: &str,
        peer: &str,
        api: ApiClient,
        data_dir: &Path,
    ) -> Self {
        let chat_id = chat_id(current_user, peer);
        let password = derive_session_password(current_user, peer);
        let cache = DisplayCache::open(data_dir.join(format!("cache_{current_user}.json")));
        info!(chat_id = %chat_id, "chat session opened");

        Self {
            current_user: current_user.to_string(),
            peer: peer.to_string(),
            chat_id,
            session: SessionCipher::new(&password),
            api,
            cache,
            media_dir: data_dir.join("media"),
        }
    }

    /// The canonical id of this conversation.
    pub fn id(&self) -> &str {
        &self.chat_id
    }

    /// Loads the full message history from the store.
    pub fn fetch_messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self.api.load_messages(&self.chat_id)?)
    }

    /// Cached display entry for a message, if the user decrypted it before.
    pub fn cached(&self, message: &Message) -> Option<&CacheEntry> {
        message_id(message).and_then(|id| self.cache.get(&id))
    }

    /// Encrypts and stores a text message.
    ///
    /// The per-message key seals layers 1 and 2; the session password seals
    /// layer 3. The sender's own plaintext is cached so the message renders
    /// without re-entering the key.
    pub fn send_text(&mut self, text: &str, layer_key: &str) -> Result<Message, ChatError> {
        let envelope = pipeline::encrypt_text(text, layer_key, &self.session)?;
        let message = Message::text(&self.current_user, &self.peer, envelope);
        self.api.save_message(&self.chat_id, &message)?;

        if let Some(id) = message_id(&message) {
            self.cache.put(id, CacheEntry::text(text.to_string(), false))?;
        }
        debug!(chat_id = %self.chat_id, "text message sent");
        Ok(message)
    }

    /// Decrypts a received (or own) text message with the user's key.
    ///
    /// Session-layer failures surface as errors; a wrong per-message key
    /// yields a [`TextDecryption::Degraded`] result, which is cached with
    /// its degraded flag so the UI can mark it.
    pub fn decrypt_message(
        &mut self,
        message: &Message,
        layer_key: &str,
    ) -> Result<TextDecryption, ChatError> {
        let envelope = message
            .data
            .as_deref()
            .ok_or(ChatError::MissingField("data"))?;

        let outcome = pipeline::decrypt_text(envelope, layer_key, &self.session)?;
        if let Some(id) = message_id(message) {
            self.cache.put(
                id,
                CacheEntry::text(outcome.text().to_string(), outcome.is_degraded()),
            )?;
        }
        Ok(outcome)
    }

    /// Hides text in a carrier image and stores it as a stegano message.
    pub fn send_hidden_image(
        &mut self,
        carrier_image: &[u8],
        filename: &str,
        secret_text: &str,
        stego_key: &str,
    ) -> Result<Message, ChatError> {
        if carrier_image.len() > MAX_FILE_SIZE {
            return Err(ChatError::FileTooLarge {
                size: carrier_image.len(),
                max: MAX_FILE_SIZE,
            });
        }

        let key = pipeline::effective_key(stego_key);
        let stego_png = stego::hide(carrier_image, secret_text, key)?;
        let file_id = self
            .api
            .upload_file(&self.chat_id, filename, stego_png.clone())?;

        let message = Message::stegano(&self.current_user, &self.peer, file_id, filename.into());
        self.api.save_message(&self.chat_id, &message)?;

        // Cache the sender's copy: the hidden text plus the stego image
        // itself, so the thumbnail shows without a download.
        if let Some(id) = message_id(&message) {
            let image_path = self.store_media(&id, &stego_png)?;
            self.cache.put(
                id,
                CacheEntry {
                    text: secret_text.to_string(),
                    image_path: Some(image_path),
                    degraded: false,
                },
            )?;
        }
        debug!(chat_id = %self.chat_id, "stegano message sent");
        Ok(message)
    }

    /// Downloads a stegano message's image and reveals its hidden text.
    pub fn reveal_hidden_image(
        &mut self,
        message: &Message,
        stego_key: &str,
    ) -> Result<String, ChatError> {
        let file_id = message
            .file_id
            .as_deref()
            .ok_or(ChatError::MissingField("file_id"))?;

        let image_bytes = self.fetch_media(file_id)?;
        let key = pipeline::effective_key(stego_key);
        let revealed = stego::reveal(&image_bytes, key)?;

        if let Some(id) = message_id(message) {
            let image_path = self.store_media(&id, &image_bytes)?;
            self.cache.put(
                id,
                CacheEntry {
                    text: revealed.clone(),
                    image_path: Some(image_path),
                    degraded: false,
                },
            )?;
        }
        Ok(revealed)
    }

    /// Encrypts a file with the chosen cipher and stores it.
    ///
    /// The two ciphers are mutually exclusive; the tag stored on the
    /// message selects the inverse on the receiving side.
    pub fn send_file(
        &mut self,
        bytes: &[u8],
        filename: &str,
        key: &str,
        method: FileCipher,
    ) -> Result<Message, ChatError> {
        if bytes.len() > MAX_FILE_SIZE {
            return Err(ChatError::FileTooLarge {
                size: bytes.len(),
                max: MAX_FILE_SIZE,
            });
        }

        let encrypted = pipeline::encrypt_file(bytes, key, method)?;
        let upload_name = format!("{filename}.enc");
        let file_id = self.api.upload_file(&self.chat_id, &upload_name, encrypted)?;

        let message = Message::file(
            &self.current_user,
            &self.peer,
            file_id,
            filename.to_string(),
            method,
        );
        self.api.save_message(&self.chat_id, &message)?;
        debug!(chat_id = %self.chat_id, method = %method, "file message sent");
        Ok(message)
    }

    /// Downloads and decrypts a file message's payload.
    pub fn open_file(&self, message: &Message, key: &str) -> Result<Vec<u8>, ChatError> {
        if message.kind != MessageKind::File {
            return Err(ChatError::MissingField("file payload"));
        }
        let file_id = message
            .file_id
            .as_deref()
            .ok_or(ChatError::MissingField("file_id"))?;
        let method = message
            .encryption_method
            .ok_or(ChatError::MissingField("encryption_method"))?;

        let encrypted = self.fetch_media(file_id)?;
        Ok(pipeline::decrypt_file(&encrypted, key, method)?)
    }

    /// Downloads a file, reusing a previously stored local copy.
    fn fetch_media(&self, file_id: &str) -> Result<Vec<u8>, ChatError> {
        let local = self.media_dir.join(file_id);
        if local.is_file() {
            return Ok(fs::read(local)?);
        }
        Ok(self.api.download_file(&self.chat_id, file_id)?)
    }

    fn store_media(&self, id: &str, bytes: &[u8]) -> Result<PathBuf, ChatError> {
        fs::create_dir_all(&self.media_dir)?;
        let path = self.media_dir.join(id);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_is_order_independent() {
        assert_eq!(chat_id("bob", "alice"), "alice_bob");
        assert_eq!(chat_id("alice", "bob"), "alice_bob");
    }

    #[test]
    fn test_session_password_is_order_independent() {
        let a = derive_session_password("zara", "adi");
        let b = derive_session_password("adi", "zara");
        assert_eq!(a, b);
        assert_eq!(a, "key_rahasia_adi_zara");
    }

    #[test]
    fn test_different_pairs_different_passwords() {
        assert_ne!(
            derive_session_password("alice", "bob"),
            derive_session_password("alice", "carol")
        );
    }
}

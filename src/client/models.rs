//! Wire models for the remote store.

use serde::{Deserialize, Serialize};

use crate::pipeline::FileCipher;

/// Message category on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Super-encrypted chat text; the envelope travels in `data`.
    Text,
    /// Encrypted file; the payload lives in file storage under `file_id`.
    File,
    /// Carrier image with hidden text; payload in file storage.
    Stegano,
}

/// One stored chat message.
///
/// `data` is populated only for text messages. File and stegano messages
/// reference their payload by `file_id`; the payload itself never enters
/// the message record. Records are immutable once stored — re-decryption
/// only updates the local display cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sender: String,
    pub recipient: String,
    /// Base64 session envelope (text messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// File-cipher tag selecting the decryption inverse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<FileCipher>,
    /// RFC 3339 timestamp, set by the sender and echoed by the store.
    #[serde(rename = "db_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    /// New outgoing text message carrying an envelope.
    pub fn text(sender: &str, recipient: &str, envelope: String) -> Self {
        Self {
            kind: MessageKind::Text,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            data: Some(envelope),
            file_id: None,
            filename: None,
            encryption_method: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// New outgoing encrypted-file message.
    pub fn file(
        sender: &str,
        recipient: &str,
        file_id: String,
        filename: String,
        method: FileCipher,
    ) -> Self {
        Self {
            kind: MessageKind::File,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            data: None,
            file_id: Some(file_id),
            filename: Some(filename),
            encryption_method: Some(method),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// New outgoing stegano-image message.
    pub fn stegano(sender: &str, recipient: &str, file_id: String, filename: String) -> Self {
        Self {
            kind: MessageKind::Stegano,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            data: None,
            file_id: Some(file_id),
            filename: Some(filename),
            encryption_method: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Registration payload: the password never leaves the client, only its
/// PBKDF2 salt/hash pair does.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub salt_hex: &'a str,
    pub hash_hex: &'a str,
}

/// Stored credential record returned for a login challenge.
#[derive(Debug, Deserialize)]
pub struct CredentialRecord {
    pub salt_hex: String,
    pub hash_hex: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VigenereRequest<'a> {
    pub text: &'a str,
    pub key: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VigenereResponse {
    pub result: String,
}

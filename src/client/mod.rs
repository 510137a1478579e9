//! Blocking client for the remote store.
//!
//! The remote service owns persistence: accounts, message records, and
//! opaque uploaded files. Every call here is a plain blocking request — the
//! cryptographic pipeline never does I/O, and callers poll or dispatch to a
//! worker as they see fit. Transport failures are fatal to the single
//! operation and are never retried automatically.

pub mod models;

use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use thiserror::Error;
use tracing::debug;

use models::{
    AckResponse, ContactsResponse, CredentialRecord, Message, RegisterRequest, UploadResponse,
    VigenereRequest, VigenereResponse,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised by remote-store operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, timeout, or protocol-level failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error payload.
    #[error("Server rejected request: {0}")]
    Rejected(String),

    /// The server answered 200 but the body was not the expected shape.
    #[error("Unexpected server response: {0}")]
    UnexpectedResponse(String),
}

/// Thin typed wrapper over the store's HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers an account with a client-side password hash.
    pub fn register(
        &self,
        username: &str,
        salt_hex: &str,
        hash_hex: &str,
    ) -> Result<(), ApiError> {
        let body = RegisterRequest {
            username,
            salt_hex,
            hash_hex,
        };
        let resp = self.http.post(self.url("/register")).json(&body).send()?;
        if resp.status().is_success() {
            debug!(user = username, "account registered");
            return Ok(());
        }
        let ack: AckResponse = resp.json().unwrap_or(AckResponse { message: None });
        Err(ApiError::Rejected(
            ack.message.unwrap_or_else(|| "username already taken".to_string()),
        ))
    }

    /// Fetches the stored credential record for a username.
    ///
    /// Password verification happens locally against this record; the
    /// candidate password is never transmitted.
    pub fn fetch_credentials(&self, username: &str) -> Result<CredentialRecord, ApiError> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "username": username }))
            .send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Rejected(format!("unknown user: {username}")));
        }
        Ok(resp.json()?)
    }

    /// Lists the contacts the user has chats with.
    pub fn contacts(&self, username: &str) -> Result<Vec<String>, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/get_chats/{username}")))
            .send()?;
        let body: ContactsResponse = resp.json()?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.message.unwrap_or_else(|| "contact listing failed".to_string()),
            ));
        }
        Ok(body.contacts)
    }

    /// Loads all message records for a chat.
    pub fn load_messages(&self, chat_id: &str) -> Result<Vec<Message>, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/load_messages/{chat_id}")))
            .send()?;
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }
        Ok(resp.json()?)
    }

    /// Stores one message record under a chat.
    ///
    /// The sender-side timestamp is dropped by the store, which assigns its
    /// own; file and stegano records travel without inline payload by
    /// construction.
    pub fn save_message(&self, chat_id: &str, message: &Message) -> Result<(), ApiError> {
        let mut body = serde_json::to_value(message)
            .map_err(|e| ApiError::UnexpectedResponse(e.to_string()))?;
        body["chat_id"] = serde_json::Value::String(chat_id.to_string());

        let resp = self.http.post(self.url("/save_message")).json(&body).send()?;
        if resp.status().is_success() {
            debug!(chat_id, kind = ?message.kind, "message stored");
            Ok(())
        } else {
            Err(ApiError::Rejected(format!(
                "message store failed with HTTP {}",
                resp.status()
            )))
        }
    }

    /// Uploads opaque file bytes, returning the store's file id.
    pub fn upload_file(
        &self,
        chat_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let size = bytes.len();
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(self.url(&format!("/upload_file/{chat_id}")))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()?;

        let body: UploadResponse = resp.json()?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.message.unwrap_or_else(|| "upload failed".to_string()),
            ));
        }
        let file_id = body
            .file_id
            .ok_or_else(|| ApiError::UnexpectedResponse("upload ack without file_id".to_string()))?;
        debug!(chat_id, file_id = %file_id, size, "file uploaded");
        Ok(file_id)
    }

    /// Downloads opaque file bytes by id.
    pub fn download_file(&self, chat_id: &str, file_id: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .http
            .get(self.url(&format!("/download_file/{chat_id}/{file_id}")))
            .timeout(UPLOAD_TIMEOUT)
            .send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Rejected(format!(
                "download failed with HTTP {}",
                resp.status()
            )));
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// Evaluates the substitution cipher remotely (encode direction).
    ///
    /// Interchangeable with [`crate::crypto::vigenere::encode`]; the local
    /// algorithm is authoritative.
    pub fn remote_vigenere_encrypt(&self, text: &str, key: &str) -> Result<String, ApiError> {
        self.remote_vigenere("/encrypt/vigenere", text, key)
    }

    /// Evaluates the substitution cipher remotely (decode direction).
    pub fn remote_vigenere_decrypt(&self, text: &str, key: &str) -> Result<String, ApiError> {
        self.remote_vigenere("/decrypt/vigenere", text, key)
    }

    fn remote_vigenere(&self, path: &str, text: &str, key: &str) -> Result<String, ApiError> {
        let body = VigenereRequest { text, key };
        let resp = self.http.post(self.url(path)).json(&body).send()?;
        if !resp.status().is_success() {
            return Err(ApiError::Rejected(format!(
                "cipher endpoint failed with HTTP {}",
                resp.status()
            )));
        }
        let body: VigenereResponse = resp.json()?;
        Ok(body.result)
    }
}

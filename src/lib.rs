//! # MistChat - layered-encryption chat
//!
//! MistChat is a chat client whose messages pass through a composable chain
//! of three independent encryption layers, with partial-failure tolerance
//! between them.
//!
//! ## The pipeline
//!
//! Outgoing text:
//!
//! ```text
//! plaintext
//!   -> layer 1: keyed substitution cipher        (per-message key)
//!   -> layer 2: White-Mist string cipher         (same key, text framing)
//!   -> layer 3: scrypt + AES-256-GCM session AEAD (shared session password)
//!   -> base64 envelope stored at the remote store
//! ```
//!
//! Receive reverses the chain with one deliberate asymmetry: only the
//! session layer may fail hard. It is the single integrity check in the
//! chain, so its authentication failure means a wrong session password or a
//! corrupted envelope. Failures in the inner layers almost always mean the
//! human typed the wrong per-message key — routine, and not worth an error
//! dialog — so the chain degrades instead, always producing some text and
//! tagging it [`pipeline::TextDecryption::Degraded`].
//!
//! ## Side channels
//!
//! - **Image hiding**: layer-1 output embedded in a carrier image's
//!   least-significant bits ([`stego`]). Layers 2 and 3 are not involved;
//!   an intentionally weaker, experimental mode.
//! - **Files**: raw bytes sealed with exactly one of the session AEAD or
//!   White-Mist binary framing ([`pipeline::file`]), never both, selected
//!   by a tag on the message.
//!
//! ## Security model
//!
//! - The session password is derived from the sorted username pair; anyone
//!   who knows both usernames can derive it. Real confidentiality against a
//!   third party rests on the per-message key, which is agreed out-of-band
//!   and never stored or logged.
//! - White-Mist is obfuscation, not integrity. Tamper detection comes from
//!   the AEAD layer alone.
//!
//! ## Modules
//!
//! - [`crypto`]: the three layers plus account-password hashing and the
//!   config vault
//! - [`pipeline`]: layer composition, degradation policy, file pipeline
//! - [`stego`]: LSB image hiding
//! - [`client`]: blocking client for the remote store
//! - [`chat`]: per-conversation orchestration and the display cache
//! - [`usb`]: sealed USB token registry and presence gate

pub mod chat;
pub mod client;
pub mod crypto;
pub mod pipeline;
pub mod stego;
pub mod usb;

// Re-export commonly used types at the crate root
pub use chat::{chat_id, derive_session_password, ChatError, ChatSession};
pub use client::models::{Message, MessageKind};
pub use client::{ApiClient, ApiError};
pub use crypto::aead::{SessionCipher, SessionCipherError};
pub use pipeline::{
    decrypt_file, decrypt_text, encrypt_file, encrypt_text, FileCipher, PipelineError,
    TextDecryption, DEFAULT_LAYER_KEY,
};
pub use stego::{hide, reveal, StegoError};

//! Chat orchestration: sessions, display cache, errors.
//!
//! Everything here is thin glue around [`crate::pipeline`] and
//! [`crate::client`]: the cryptography itself lives below, the remote store
//! owns persistence, and this layer only keeps the two in step for one
//! conversation at a time.

mod cache;
mod error;
mod session;

pub use cache::{message_id, CacheEntry, DisplayCache};
pub use error::ChatError;
pub use session::{chat_id, derive_session_password, ChatSession, MAX_FILE_SIZE};

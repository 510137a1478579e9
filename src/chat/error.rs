//! Chat error types.

use thiserror::Error;

use crate::client::ApiError;
use crate::pipeline::PipelineError;
use crate::stego::StegoError;

/// Errors that can occur during chat operations.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Pipeline failure (session authentication, malformed payload).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Remote store failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Image hiding failure.
    #[error(transparent)]
    Stego(#[from] StegoError),

    /// Upload exceeds the store's size limit.
    #[error("File too large: {size} bytes (limit {max})")]
    FileTooLarge {
        /// Actual payload size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Message record is missing a field the operation needs.
    #[error("Message has no {0}")]
    MissingField(&'static str),

    /// Display-cache I/O failure.
    #[error("Cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),
}

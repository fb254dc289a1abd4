//! Error types for the archive reader and asset decoders

use std::io;
use thiserror::Error;

use crate::compression::CompressionError;
use crate::header::HeaderError;

/// Primary error type for archive and decoder operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("glTF JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Never produced by table decryption (the cipher is total); reserved
    /// for encrypted file payload support.
    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("invalid data: {0}")]
    Format(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("allocation of {0} bytes failed")]
    OutOfMemory(usize),
}

/// Result type for archive and decoder operations
pub type Result<T> = std::result::Result<T, Error>;

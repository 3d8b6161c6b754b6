//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during content-hashing operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid hex encoding.
    #[error("invalid hex encoding")]
    InvalidHexEncoding,

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,

    /// I/O error (e.g. reading the binary being hashed).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type for content-hashing operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

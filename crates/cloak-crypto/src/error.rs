//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A provisioned shared secret failed length, distinctness, or
    /// independence checks, or contained an out-of-range byte value.
    #[error("invalid shared secret: {0}")]
    InvalidSharedSecret(&'static str),

    /// A cipher operation was given data it cannot process (wrong key or
    /// IV length). Deliberately a single kind: callers never see the
    /// underlying library detail.
    #[error("cipher operation failed")]
    InvalidData,

    /// Message authentication failed.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The platform's random generator reported insufficient strength.
    #[error("random source unavailable or weak: {0}")]
    WeakRandomSource(String),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

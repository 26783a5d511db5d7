//! Error types for protocol operations.

use cloak_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur while building, sealing, or opening envelopes.
///
/// Every operation fails fast with exactly one of these; partial results
/// are never exposed. The categories are distinct so callers can treat a
/// failed signature or stale timestamp as a security event and malformed
/// data as a client bug.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// A value's type is outside the permitted scalar/container set, or a
    /// required field carried the wrong JSON type.
    #[error("unsupported variable type")]
    UnsupportedVariableType,

    /// A container's shape violates a structural rule (headers not flat
    /// scalar lists, upload descriptor missing required keys).
    #[error("invalid array format: {0}")]
    InvalidArrayFormat(&'static str),

    /// A container was found within its own ancestry during validation.
    #[error("circular references detected")]
    CircularReferences,

    /// Malformed hex or JSON, a wrong fixed-length field, or a malformed
    /// transmittable string prefix.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),

    /// Payload timestamp non-numeric or older than the freshness window.
    #[error("invalid or stale timestamp")]
    InvalidTimestamp,

    /// JSON or base64 encoding failed (for example nesting too deep).
    #[error("encoding failed: {0}")]
    EncodingFailure(String),

    /// A cryptographic primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

//! Protocol limits and constants.
//!
//! Cipher, MAC, and secret lengths live next to their primitives in
//! `cloak-crypto`; everything protocol-level is defined here.

/// Request id length in bytes (hex-encoded to 64 characters on the wire).
pub const ID_LENGTH: usize = 32;

/// Upload integrity hash length in bytes (SHA-512 of the out-of-band
/// file, hex-encoded to 128 characters on the wire).
pub const UPLOAD_HASH_LENGTH: usize = 64;

/// Maximum JSON nesting depth of the inner payload document.
///
/// The payload object itself is one level, so user data may nest up to
/// 512 containers. Applies to both encoding and untrusted input.
pub const MAX_NESTING_DEPTH: usize = 513;

/// Freshness window in seconds. Payloads older than this are treated as
/// replayed; payloads from the future are accepted (only staleness is
/// checked).
pub const REPLAY_WINDOW_SECS: i64 = 10;

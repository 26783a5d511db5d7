//! # cloak-crypto
//!
//! Cryptographic primitives for the cloak envelope protocol.
//!
//! This crate provides:
//! - **SharedSecretPair**: derivation and validation of the two operational
//!   keys from a pair of pre-shared raw secrets
//! - **Cipher**: AES-256 in CTR mode (encrypt-then-MAC construction; the
//!   MAC is supplied separately by [`SignatureEngine`])
//! - **SignatureEngine**: HMAC-SHA-512 message authentication
//! - **EntropySource**: cryptographically strong random bytes behind a
//!   trait so callers can substitute deterministic entropy in tests
//!
//! ## Security
//!
//! All secret data uses `zeroize` for secure memory cleanup.
//! All comparisons of secrets use constant-time operations via `subtle`.
//! Entropy that the platform cannot vouch for is an error, never a
//! silent fallback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod error;
pub mod random;
pub mod secrets;
pub mod signing;

pub use cipher::{Cipher, IV_LENGTH, KEY_LENGTH};
pub use error::{CryptoError, Result};
pub use random::{EntropySource, OsEntropy};
pub use secrets::{SharedSecretPair, SECRET_MIN_LENGTH};
pub use signing::{SignatureEngine, SIGNATURE_LENGTH};

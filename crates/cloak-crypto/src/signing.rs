//! HMAC-SHA-512 message authentication.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::{CryptoError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Signature (MAC tag) length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Keyed-hash message authentication over HMAC-SHA-512.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignatureEngine;

impl SignatureEngine {
    /// The tag length the engine produces, in bytes.
    pub fn signature_length(&self) -> usize {
        SIGNATURE_LENGTH
    }

    /// Compute the authentication tag for `message` under `key`.
    pub fn compute(&self, message: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha512::new_from_slice(key).map_err(|_| CryptoError::InvalidData)?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Verify that `expected` is the tag for `message` under `key`.
    ///
    /// The tag comparison is constant-time and does not short-circuit on
    /// a length mismatch.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidSignature`] on any mismatch.
    pub fn verify(&self, message: &[u8], expected: &[u8], key: &[u8]) -> Result<()> {
        let mut mac = HmacSha512::new_from_slice(key).map_err(|_| CryptoError::InvalidData)?;
        mac.update(message);
        mac.verify_slice(expected)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

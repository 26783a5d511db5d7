//! Cryptographically strong random byte generation.
//!
//! Randomness sits behind [`EntropySource`] so deterministic sources can
//! be injected in tests; production code uses [`OsEntropy`].

use rand::rngs::OsRng;
use rand::RngCore;

use crate::{CryptoError, Result};

/// A source of cryptographically strong random bytes.
pub trait EntropySource {
    /// Produce `len` random bytes.
    ///
    /// # Errors
    ///
    /// [`CryptoError::WeakRandomSource`] if the source cannot vouch for
    /// the strength of its output. Implementations must fail rather than
    /// silently degrade.
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>>;
}

/// The operating system's random generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::WeakRandomSource(e.to_string()))?;
        Ok(bytes)
    }
}

//! Shared-secret derivation and validation.
//!
//! A channel is provisioned out-of-band with two raw secrets. From those
//! this module derives the two operational keys:
//!
//! ```text
//! operational_secret_1 = raw1[0..32]          (cipher key, exactly 32 bytes)
//! operational_secret_2 = raw1[32..] ++ raw2   (MAC key, at least 32 bytes)
//! ```
//!
//! Both raw inputs are validated before derivation: each must be at least
//! 32 bytes, the two must not be byte-equal, their 32-byte prefixes must
//! differ, and neither may contain the other as a substring. Related or
//! overlapping secrets would let one derived key leak information about
//! the other.
//!
//! All equality work on secret material is constant-time.

use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Minimum length of each provisioned raw secret in bytes.
pub const SECRET_MIN_LENGTH: usize = 32;

/// The two operational keys derived from a pair of provisioned raw
/// secrets.
///
/// Immutable once constructed. Intended to be owned by exactly one
/// encrypting or decrypting party for the lifetime of a channel; the key
/// material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecretPair {
    secret1: [u8; SECRET_MIN_LENGTH],
    secret2: Vec<u8>,
}

impl SharedSecretPair {
    /// Derive the operational keys from two raw secrets given as byte
    /// strings.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSharedSecret`] if either input is
    /// shorter than 32 bytes, the inputs are equal, their first 32 bytes
    /// are equal, or one contains the other.
    pub fn new(raw1: impl AsRef<[u8]>, raw2: impl AsRef<[u8]>) -> Result<Self> {
        let raw1 = raw1.as_ref();
        let raw2 = raw2.as_ref();

        ensure_validity(raw1, raw2)?;

        let mut secret1 = [0u8; SECRET_MIN_LENGTH];
        secret1.copy_from_slice(&raw1[..SECRET_MIN_LENGTH]);

        let mut secret2 = Vec::with_capacity(raw1.len() - SECRET_MIN_LENGTH + raw2.len());
        secret2.extend_from_slice(&raw1[SECRET_MIN_LENGTH..]);
        secret2.extend_from_slice(raw2);

        Ok(Self { secret1, secret2 })
    }

    /// Derive the operational keys from two raw secrets given as arrays
    /// of integer byte values, the form used by provisioning files.
    ///
    /// # Errors
    ///
    /// Any element outside `0..=255` is
    /// [`CryptoError::InvalidSharedSecret`], plus all the checks of
    /// [`SharedSecretPair::new`].
    pub fn from_byte_values(raw1: &[i64], raw2: &[i64]) -> Result<Self> {
        let raw1 = byte_values_to_bytes(raw1)?;
        let raw2 = byte_values_to_bytes(raw2)?;
        Self::new(raw1, raw2)
    }

    /// The cipher key (exactly 32 bytes).
    pub fn operational_secret_1(&self) -> &[u8; SECRET_MIN_LENGTH] {
        &self.secret1
    }

    /// The MAC key (at least 32 bytes).
    pub fn operational_secret_2(&self) -> &[u8] {
        &self.secret2
    }
}

impl std::fmt::Debug for SharedSecretPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecretPair([REDACTED])")
    }
}

fn ensure_validity(raw1: &[u8], raw2: &[u8]) -> Result<()> {
    if raw1.len() < SECRET_MIN_LENGTH || raw2.len() < SECRET_MIN_LENGTH {
        return Err(CryptoError::InvalidSharedSecret("secret too short"));
    }

    // ct_eq over slices resolves to false on length mismatch without
    // branching on content.
    if bool::from(raw1.ct_eq(raw2)) {
        return Err(CryptoError::InvalidSharedSecret("secrets are equal"));
    }

    if bool::from(raw1[..SECRET_MIN_LENGTH].ct_eq(&raw2[..SECRET_MIN_LENGTH])) {
        return Err(CryptoError::InvalidSharedSecret(
            "secrets share a 32-byte prefix",
        ));
    }

    if contains_constant_time(raw1, raw2) || contains_constant_time(raw2, raw1) {
        return Err(CryptoError::InvalidSharedSecret(
            "one secret contains the other",
        ));
    }

    Ok(())
}

/// Substring search where every window comparison is constant-time.
///
/// The number of windows scanned depends only on the input lengths, never
/// on where (or whether) a match occurs.
fn contains_constant_time(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }

    let mut found = Choice::from(0u8);
    for window in haystack.windows(needle.len()) {
        found |= window.ct_eq(needle);
    }
    found.into()
}

fn byte_values_to_bytes(values: &[i64]) -> Result<Vec<u8>> {
    values
        .iter()
        .map(|&v| {
            u8::try_from(v)
                .map_err(|_| CryptoError::InvalidSharedSecret("byte value out of range"))
        })
        .collect()
}

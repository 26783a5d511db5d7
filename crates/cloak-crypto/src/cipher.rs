//! AES-256-CTR symmetric encryption.
//!
//! CTR mode is a stream cipher: no padding, and encryption and decryption
//! are the same keystream XOR. It provides no authentication on its own;
//! the envelope layer signs the ciphertext with
//! [`SignatureEngine`](crate::SignatureEngine) before transmission
//! (encrypt-then-MAC).
//!
//! The counter is the big-endian 128-bit interpretation of the full IV,
//! matching the OpenSSL `aes-256-ctr` construction the protocol's wire
//! vectors were produced with.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

use crate::{CryptoError, Result};

type Aes256Ctr = Ctr128BE<Aes256>;

/// Cipher key length in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// IV length in bytes (one AES block).
pub const IV_LENGTH: usize = 16;

/// AES-256-CTR transform.
///
/// Stateless; both operations are pure functions of their inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cipher;

impl Cipher {
    /// The IV length the cipher requires, in bytes.
    pub fn iv_length(&self) -> usize {
        IV_LENGTH
    }

    /// Encrypt `plaintext` under `key` with the given `iv`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidData`] if the key or IV length is wrong.
    pub fn encrypt(&self, plaintext: &[u8], iv: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.apply_keystream(plaintext, iv, key)
    }

    /// Decrypt `ciphertext` under `key` with the given `iv`.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidData`] if the key or IV length is wrong.
    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.apply_keystream(ciphertext, iv, key)
    }

    fn apply_keystream(&self, input: &[u8], iv: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        let mut cipher =
            Aes256Ctr::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidData)?;
        let mut output = input.to_vec();
        cipher.apply_keystream(&mut output);
        Ok(output)
    }
}

//! Deterministic fixtures shared by unit tests.

use std::cell::Cell;

use cloak_crypto::{EntropySource, SharedSecretPair};

use crate::time::Clock;

/// Entropy source returning a repeated fixed byte.
pub(crate) struct FixedEntropy(pub u8);

impl EntropySource for FixedEntropy {
    fn random_bytes(&self, len: usize) -> cloak_crypto::Result<Vec<u8>> {
        Ok(vec![self.0; len])
    }
}

/// Fixed-byte entropy source that counts how often it is drawn from.
pub(crate) struct CountingEntropy {
    pub byte: u8,
    pub calls: Cell<usize>,
}

impl EntropySource for CountingEntropy {
    fn random_bytes(&self, len: usize) -> cloak_crypto::Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec![self.byte; len])
    }
}

/// Clock frozen at a fixed Unix timestamp.
pub(crate) struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// The secret pair used by the protocol's deterministic wire vectors.
pub(crate) fn sample_secrets() -> SharedSecretPair {
    let raw1: Vec<u8> = (0..32).collect();
    let raw2: Vec<u8> = (40u8..=102).step_by(2).collect();
    SharedSecretPair::new(raw1, raw2).unwrap()
}

/// Ciphertext produced by sealing the reference request (headers
/// `X-Foo: Bar` and `X-Baz: Foo, Bar`, data `"string"`) under
/// [`sample_secrets`] with all-`'a'` entropy at timestamp 1513694013.
pub(crate) const VECTOR_CIPHERTEXT_HEX: &str = "9c71adef9c981616931d2f5711f0789e8294b5a08a186915fd5d157b53456738f7dc6f68a5ff3486edec37b8f6499a0d0851f3c332f768f3761598a648c32891324da17557ceee44fe1805b3717a806bea477920f31b2ae5df3ccff4e60ef72e3196a48eaca97003482a60ffbc290d405e229007ce27a4e23b4c609a9313267ccc0ab1b8714d057905384d5108ebce4a5cba829f40ec475c9bd292106ad43f8faae93433c96fe1d3e4c032388ed758ab293d10fecbed56aedaae3e2a95861727de4cd85df4601f5f949c3d89f6fc51f1";

/// HMAC-SHA-512 of the vector ciphertext and IV hex under the MAC
/// secret of [`sample_secrets`].
pub(crate) const VECTOR_SIGNATURE_HEX: &str = "0634c3411628407a4f24150313aea70b71a7ab9829c715c28a6fea130880ff00b957b17118becbe890b3ec5ef98e17d60eef05487005687865440f061e6eb436";

/// IV drawn by all-`'a'` entropy, hex-encoded.
pub(crate) const VECTOR_IV_HEX: &str = "61616161616161616161616161616161";

/// Timestamp the reference request was sealed at.
pub(crate) const VECTOR_TIMESTAMP: i64 = 1_513_694_013;

/// The complete reference envelope as wire text.
pub(crate) fn vector_transmit() -> String {
    format!(
        "{{\"data\":\"{VECTOR_CIPHERTEXT_HEX}\",\"iv\":\"{VECTOR_IV_HEX}\",\
         \"signature\":\"{VECTOR_SIGNATURE_HEX}\"}}"
    )
}

//! Property tests over the codec and the full seal/open path.

use std::sync::Arc;

use proptest::prelude::*;

use crate::codec::{from_transmittable, to_transmittable};
use crate::encryptor::{Encryptor, Request};
use crate::testutil::{sample_secrets, FixedClock, FixedEntropy};
use crate::value::{Headers, Value};
use crate::{Decryptor, ProtocolError};

proptest! {
    /// Every byte string survives the transmittable transform.
    #[test]
    fn transmittable_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let encoded = to_transmittable(&bytes);
        let decoded = from_transmittable(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), bytes.as_slice());
    }

    /// Sealing and opening recovers arbitrary binary data bytes intact.
    #[test]
    fn seal_open_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let now = 1_700_000_000;
        let encryptor = Encryptor::with_collaborators(
            sample_secrets(),
            Arc::new(FixedEntropy(3)),
            Arc::new(FixedClock(now)),
        );
        let decryptor = Decryptor::with_clock(sample_secrets(), Arc::new(FixedClock(now)));

        let sealed = encryptor
            .encrypt(Request::new(Headers::new(), Value::from(bytes.clone())))
            .unwrap();
        let opened = decryptor.decrypt(&sealed.transmit).unwrap();
        prop_assert_eq!(opened.payload.data(), &Value::from(bytes));
    }

    /// Flipping any single hex character of the ciphertext, IV, or
    /// signature fails verification.
    #[test]
    fn tampering_never_verifies(seed in 0usize..4096) {
        let now = 1_700_000_000;
        let encryptor = Encryptor::with_collaborators(
            sample_secrets(),
            Arc::new(FixedEntropy(5)),
            Arc::new(FixedClock(now)),
        );
        let sealed = encryptor
            .encrypt(Request::new(Headers::new(), "tamper target"))
            .unwrap();

        let mut wire: serde_json::Value = serde_json::from_str(&sealed.transmit).unwrap();
        let object = wire.as_object_mut().unwrap();
        let field_names = ["data", "iv", "signature"];
        let field = field_names[seed % field_names.len()];
        let text = object[field].as_str().unwrap().to_owned();

        let position = (seed / field_names.len()) % text.len();
        let mut bytes = text.into_bytes();
        bytes[position] = if bytes[position] == b'a' { b'b' } else { b'a' };
        object[field] = serde_json::Value::String(String::from_utf8(bytes).unwrap());

        let tampered = serde_json::to_string(&wire).unwrap();
        let err = Decryptor::with_clock(sample_secrets(), Arc::new(FixedClock(now)))
            .decrypt(&tampered)
            .unwrap_err();
        prop_assert!(matches!(
            err,
            ProtocolError::Crypto(cloak_crypto::CryptoError::InvalidSignature)
        ));
    }
}

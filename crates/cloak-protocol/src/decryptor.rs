//! Receiving side: verify, decrypt, and re-validate incoming wire text.

use std::sync::Arc;

use tracing::debug;

use cloak_crypto::SharedSecretPair;

use crate::envelope::Envelope;
use crate::limits::REPLAY_WINDOW_SECS;
use crate::payload::Payload;
use crate::time::{Clock, SystemClock};
use crate::{ProtocolError, Result};

/// A successfully opened request.
#[derive(Debug)]
pub struct OpenedRequest {
    /// The recovered payload.
    pub payload: Payload,
    /// The envelope signature that authenticated it, 128 lowercase hex
    /// characters. Echoing it back proves this envelope was opened.
    pub signature: String,
}

/// Opens envelopes sealed under a fixed secret pair.
pub struct Decryptor {
    secrets: SharedSecretPair,
    clock: Arc<dyn Clock>,
}

impl Decryptor {
    /// A decryptor checking freshness against the system clock.
    pub fn new(secrets: SharedSecretPair) -> Self {
        Self::with_clock(secrets, Arc::new(SystemClock))
    }

    /// A decryptor with an explicit clock, for deterministic operation.
    pub fn with_clock(secrets: SharedSecretPair, clock: Arc<dyn Clock>) -> Self {
        Self { secrets, clock }
    }

    /// Parse, authenticate, decrypt, and freshness-check `transmit`.
    ///
    /// The signature is verified before the ciphertext is decrypted, and
    /// the payload is re-validated in full after decryption.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidData`] for a malformed envelope,
    /// [`ProtocolError::Crypto`] for a failed signature, any payload
    /// validation error for a malformed document, and
    /// [`ProtocolError::InvalidTimestamp`] for a stale payload.
    pub fn decrypt(&self, transmit: &str) -> Result<OpenedRequest> {
        let envelope = Envelope::from_wire_text(transmit)?;
        let payload = envelope.open(&self.secrets)?;
        self.ensure_fresh(payload.timestamp())?;

        let id = payload.id()?;
        debug!(id = %id, "opened request");

        Ok(OpenedRequest {
            payload,
            signature: envelope.signature().to_owned(),
        })
    }

    /// Payloads may lag the local clock by the replay window at most.
    /// Future timestamps are accepted; clock skew should not reject
    /// otherwise valid traffic, and only staleness enables replay.
    fn ensure_fresh(&self, timestamp: i64) -> Result<()> {
        if timestamp < self.clock.now() - REPLAY_WINDOW_SECS {
            return Err(ProtocolError::InvalidTimestamp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryptor::{Encryptor, Request};
    use crate::testutil::{
        sample_secrets, vector_transmit, FixedClock, FixedEntropy, VECTOR_SIGNATURE_HEX,
        VECTOR_TIMESTAMP,
    };
    use crate::value::{ByteString, Headers, Value};
    use cloak_crypto::CryptoError;

    fn vector_decryptor(now: i64) -> Decryptor {
        Decryptor::with_clock(sample_secrets(), Arc::new(FixedClock(now)))
    }

    #[test]
    fn test_reference_vector() {
        let opened = vector_decryptor(VECTOR_TIMESTAMP)
            .decrypt(&vector_transmit())
            .unwrap();

        let payload = &opened.payload;
        assert_eq!(payload.id().unwrap(), "61".repeat(32));
        assert_eq!(payload.timestamp(), VECTOR_TIMESTAMP);
        assert_eq!(payload.data(), &Value::from("string"));
        assert_eq!(payload.url(), None);
        assert_eq!(payload.method(), None);
        assert_eq!(payload.uploads(), None);
        assert_eq!(opened.signature, VECTOR_SIGNATURE_HEX);

        let mut expected = Headers::new();
        expected.insert(ByteString::from("X-Foo"), vec![Value::from("Bar")]);
        expected.insert(
            ByteString::from("X-Baz"),
            vec![Value::from("Foo"), Value::from("Bar")],
        );
        assert_eq!(payload.headers(), &expected);
    }

    #[test]
    fn test_freshness_window_boundary() {
        let transmit = vector_transmit();

        // Exactly at the edge of the window.
        assert!(vector_decryptor(VECTOR_TIMESTAMP + REPLAY_WINDOW_SECS)
            .decrypt(&transmit)
            .is_ok());

        // One second past it.
        let err = vector_decryptor(VECTOR_TIMESTAMP + REPLAY_WINDOW_SECS + 1)
            .decrypt(&transmit)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidTimestamp));
    }

    #[test]
    fn test_future_timestamps_are_accepted() {
        assert!(vector_decryptor(VECTOR_TIMESTAMP - 3600)
            .decrypt(&vector_transmit())
            .is_ok());
    }

    #[test]
    fn test_wrong_secrets_fail_signature() {
        let raw1: Vec<u8> = (0..32).collect();
        let other = SharedSecretPair::new(raw1, vec![0xAB; 32]).unwrap();
        let err = Decryptor::with_clock(other, Arc::new(FixedClock(VECTOR_TIMESTAMP)))
            .decrypt(&vector_transmit())
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Crypto(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_transmit_is_rejected_before_crypto() {
        for bad in [
            "not json",
            "[]",
            "{\"data\":\"1\",\"iv\":\"2\",\"signature\":\"3\"}",
            "{\"data\":\"ff\",\"iv\":\"61\",\"signature\":\"34\"}",
        ] {
            let err = vector_decryptor(VECTOR_TIMESTAMP).decrypt(bad).unwrap_err();
            assert!(matches!(err, ProtocolError::InvalidData(_)), "{bad}");
        }
    }

    #[test]
    fn test_seal_and_open_round_trip() {
        let now = 1_700_000_000;
        let encryptor = Encryptor::with_collaborators(
            sample_secrets(),
            Arc::new(FixedEntropy(9)),
            Arc::new(FixedClock(now)),
        );

        let mut headers = Headers::new();
        headers.insert(ByteString::from("X-Req"), vec![Value::from(1)]);
        let mut request = Request::new(
            headers,
            Value::map([("nested", Value::list(vec![Value::from("deep")]))]),
        );
        request.url = Some(ByteString::from("/submit"));
        request.method = Some(ByteString::from("POST"));

        let sealed = encryptor.encrypt(request).unwrap();
        let opened = vector_decryptor(now).decrypt(&sealed.transmit).unwrap();

        assert_eq!(opened.payload.id().unwrap(), sealed.id);
        assert_eq!(opened.signature, sealed.signature);
        assert_eq!(opened.payload.method(), Some(ByteString::from("post")));
        assert_eq!(
            opened.payload.data(),
            &Value::map([("nested", Value::list(vec![Value::from("deep")]))])
        );
    }
}

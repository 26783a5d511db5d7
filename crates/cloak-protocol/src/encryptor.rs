//! Sending side: turn a structured request into sealed wire text.

use std::sync::Arc;

use tracing::debug;

use cloak_crypto::{EntropySource, OsEntropy, SharedSecretPair};

use crate::envelope::Envelope;
use crate::payload::{Payload, Uploads};
use crate::time::{Clock, SystemClock};
use crate::value::{ByteString, Headers, Value};
use crate::Result;

/// A request to be sealed.
///
/// Only `headers` and `data` are required; everything else defaults to
/// absent. The id is normally generated, but a caller that needs to
/// correlate the response can force one.
pub struct Request {
    /// Header map.
    pub headers: Headers,
    /// Request data, any acyclic value.
    pub data: Value,
    /// Forced payload id (64 lowercase hex characters), or `None` to
    /// generate one.
    pub id: Option<String>,
    /// Request URL.
    pub url: Option<ByteString>,
    /// HTTP method.
    pub method: Option<ByteString>,
    /// Upload manifest.
    pub uploads: Option<Uploads>,
}

impl Request {
    /// A request with the given headers and data and no optional fields.
    pub fn new(headers: Headers, data: impl Into<Value>) -> Self {
        Self {
            headers,
            data: data.into(),
            id: None,
            url: None,
            method: None,
            uploads: None,
        }
    }
}

/// The result of sealing a request.
#[derive(Debug)]
pub struct SealedRequest {
    /// Envelope wire text ready for transmission.
    pub transmit: String,
    /// The payload id, 64 lowercase hex characters.
    pub id: String,
    /// The envelope signature, 128 lowercase hex characters. The
    /// receiving side can echo it to prove it opened this envelope.
    pub signature: String,
}

/// Seals requests under a fixed secret pair.
pub struct Encryptor {
    secrets: SharedSecretPair,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
}

impl Encryptor {
    /// An encryptor drawing from OS entropy and the system clock.
    pub fn new(secrets: SharedSecretPair) -> Self {
        Self::with_collaborators(secrets, Arc::new(OsEntropy), Arc::new(SystemClock))
    }

    /// An encryptor with explicit entropy and clock, for deterministic
    /// operation.
    pub fn with_collaborators(
        secrets: SharedSecretPair,
        entropy: Arc<dyn EntropySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secrets,
            entropy,
            clock,
        }
    }

    /// Validate, seal, and serialize `request`.
    ///
    /// # Errors
    ///
    /// Any payload validation error, or a crypto error from the entropy
    /// source or primitives.
    pub fn encrypt(&self, request: Request) -> Result<SealedRequest> {
        let mut builder = Payload::builder()
            .headers(request.headers)
            .data(request.data)
            .entropy(self.entropy.clone())
            .clock(self.clock.clone());
        if let Some(id) = request.id {
            builder = builder.id(id);
        }
        if let Some(url) = request.url {
            builder = builder.url(url);
        }
        if let Some(method) = request.method {
            builder = builder.method(method);
        }
        if let Some(uploads) = request.uploads {
            builder = builder.uploads(uploads);
        }
        let payload = builder.build()?;

        let envelope = Envelope::carry(&payload, &self.secrets, self.entropy.as_ref())?;
        let id = payload.id()?.to_owned();
        let signature = envelope.signature().to_owned();
        let transmit = envelope.to_wire_text()?;

        debug!(id = %id, bytes = transmit.len(), "sealed request");

        Ok(SealedRequest {
            transmit,
            id,
            signature,
        })
    }
}

//! The outer envelope: the only thing that crosses the wire.
//!
//! An envelope is a flat JSON object with exactly three fields, all
//! lowercase hex strings: `data` (ciphertext), `iv`, and `signature`
//! (HMAC-SHA-512 over the concatenation of the data and iv hex text, in
//! that order). The outer object is plain JSON; the string transform
//! applies only to the encrypted payload inside.
//!
//! Opening verifies the signature before touching the ciphertext, so no
//! attacker-controlled bytes reach the cipher or the JSON parser without
//! authentication.

use cloak_crypto::{Cipher, EntropySource, SharedSecretPair, SignatureEngine, SIGNATURE_LENGTH};

use crate::codec;
use crate::payload::Payload;
use crate::validate;
use crate::{ProtocolError, Result};

const WIRE_FIELDS: [&str; 3] = ["data", "iv", "signature"];

/// A sealed envelope holding hex-encoded ciphertext, IV, and signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    data: String,
    iv: String,
    signature: String,
}

impl Envelope {
    /// Seal `payload` under `secrets`, drawing a fresh IV from `entropy`.
    pub fn carry(
        payload: &Payload,
        secrets: &SharedSecretPair,
        entropy: &dyn EntropySource,
    ) -> Result<Self> {
        let cipher = Cipher;
        let iv = entropy.random_bytes(cipher.iv_length())?;
        let plaintext = payload.to_wire_text()?;
        let ciphertext = cipher.encrypt(plaintext.as_bytes(), &iv, secrets.operational_secret_1())?;

        let data = hex::encode(ciphertext);
        let iv = hex::encode(iv);
        let message = format!("{data}{iv}");
        let tag = SignatureEngine.compute(message.as_bytes(), secrets.operational_secret_2())?;

        Ok(Self {
            data,
            iv,
            signature: hex::encode(tag),
        })
    }

    /// Verify the signature and decrypt, recovering the payload.
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidSignature`](cloak_crypto::CryptoError::InvalidSignature)
    /// (wrapped in [`ProtocolError::Crypto`]) if the signature does not
    /// verify; any payload validation error if the decrypted document is
    /// malformed.
    pub fn open(&self, secrets: &SharedSecretPair) -> Result<Payload> {
        let message = format!("{}{}", self.data, self.iv);
        let expected = decode_hex(&self.signature)?;
        SignatureEngine.verify(message.as_bytes(), &expected, secrets.operational_secret_2())?;

        let ciphertext = decode_hex(&self.data)?;
        let iv = decode_hex(&self.iv)?;
        let plaintext = Cipher.decrypt(&ciphertext, &iv, secrets.operational_secret_1())?;
        let text = String::from_utf8(plaintext)
            .map_err(|_| ProtocolError::InvalidData("payload is not valid utf-8"))?;
        Payload::from_wire_text(&text)
    }

    /// Render the envelope as its JSON wire form.
    pub fn to_wire_text(&self) -> Result<String> {
        let mut object = serde_json::Map::new();
        object.insert("data".to_owned(), self.data.clone().into());
        object.insert("iv".to_owned(), self.iv.clone().into());
        object.insert("signature".to_owned(), self.signature.clone().into());
        serde_json::to_string(&serde_json::Value::Object(object))
            .map_err(|e| ProtocolError::EncodingFailure(e.to_string()))
    }

    /// Parse an envelope from wire text, checking the shape of every
    /// field before any cryptography runs.
    pub fn from_wire_text(text: &str) -> Result<Self> {
        let object = codec::decode_object_exact(text, &WIRE_FIELDS)?;
        let field = |name: &str| -> Result<&str> {
            object[name]
                .as_str()
                .ok_or(ProtocolError::InvalidData("envelope fields must be strings"))
        };

        let data = field("data")?;
        validate::ensure_hex(data, None)?;
        let iv = field("iv")?;
        validate::ensure_hex(iv, Some(2 * Cipher.iv_length()))?;
        let signature = field("signature")?;
        validate::ensure_hex(signature, Some(2 * SIGNATURE_LENGTH))?;

        Ok(Self {
            data: data.to_owned(),
            iv: iv.to_owned(),
            signature: signature.to_owned(),
        })
    }

    /// Hex-encoded ciphertext.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Hex-encoded IV.
    pub fn iv(&self) -> &str {
        &self.iv
    }

    /// Hex-encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|_| ProtocolError::InvalidData("malformed hex field"))
}

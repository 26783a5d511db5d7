//! Symmetric authenticated envelope protocol for structured API
//! requests.
//!
//! Two parties that already share a pair of secrets exchange requests as
//! sealed envelopes: the payload (headers, data, optional uploads, URL,
//! and method, plus a random id and a timestamp) is serialized to
//! binary-safe JSON, encrypted with AES-256-CTR, and authenticated with
//! HMAC-SHA-512 over the ciphertext (encrypt-then-MAC). The receiving
//! side verifies before decrypting, re-validates the decrypted document
//! in full, and rejects payloads older than a short freshness window.
//!
//! ```
//! use cloak_crypto::SharedSecretPair;
//! use cloak_protocol::{Decryptor, Encryptor, Headers, Request, Value};
//!
//! # fn main() -> cloak_protocol::Result<()> {
//! let secrets = SharedSecretPair::new([1u8; 40], [2u8; 32])?;
//!
//! let mut headers = Headers::new();
//! headers.insert("Content-Type".into(), vec![Value::from("application/json")]);
//! let sealed = Encryptor::new(secrets).encrypt(Request::new(headers, "hello"))?;
//!
//! let secrets = SharedSecretPair::new([1u8; 40], [2u8; 32])?;
//! let opened = Decryptor::new(secrets).decrypt(&sealed.transmit)?;
//! assert_eq!(opened.payload.data(), &Value::from("hello"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod decryptor;
pub mod encryptor;
pub mod envelope;
pub mod error;
pub mod limits;
pub mod payload;
pub mod time;
pub mod validate;
pub mod value;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod testutil;

pub use decryptor::{Decryptor, OpenedRequest};
pub use encryptor::{Encryptor, Request, SealedRequest};
pub use envelope::Envelope;
pub use error::{ProtocolError, Result};
pub use payload::{Payload, PayloadBuilder, UploadDescriptor, UploadEntry, Uploads};
pub use time::{Clock, SystemClock};
pub use value::{ByteString, Headers, Value};

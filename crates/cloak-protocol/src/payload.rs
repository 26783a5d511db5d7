//! The inner payload document: headers, data, uploads, routing fields,
//! and the lazily assigned id and timestamp.
//!
//! A payload is built either by the sending side through
//! [`PayloadBuilder`] (which validates everything eagerly) or by the
//! receiving side from decrypted wire text (which re-validates every
//! field, since decrypted bytes are still untrusted until checked).

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use cloak_crypto::{EntropySource, OsEntropy};

use crate::codec;
use crate::limits::{ID_LENGTH, UPLOAD_HASH_LENGTH};
use crate::time::{Clock, SystemClock};
use crate::validate;
use crate::value::{ByteString, Headers, Value};
use crate::{ProtocolError, Result};

const WIRE_FIELDS: [&str; 7] = [
    "id",
    "timestamp",
    "headers",
    "data",
    "uploads",
    "url",
    "method",
];

const DESCRIPTOR_FIELDS: [&str; 3] = ["filename", "name", "signature"];

/// Upload manifest: ordered map from form field name to entry.
pub type Uploads = IndexMap<ByteString, UploadEntry>;

/// One entry of the upload manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadEntry {
    /// SHA-512 of the file content, 128 lowercase hex characters.
    Hash(String),
    /// Reference to a file sealed in a separate envelope.
    Descriptor(UploadDescriptor),
}

/// Descriptor for an upload travelling in its own envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadDescriptor {
    /// Client-side file name.
    pub filename: ByteString,
    /// Form field name the file was posted under.
    pub name: ByteString,
    /// Envelope signature of the separately sealed file, 128 lowercase
    /// hex characters.
    pub signature: String,
}

/// A validated payload ready to be sealed, or recovered from an opened
/// envelope.
///
/// The id and timestamp are assigned lazily on first access and then
/// memoized, so a payload observed twice reports the same identity.
pub struct Payload {
    headers: Headers,
    data: Value,
    uploads: Option<Uploads>,
    url: Option<ByteString>,
    method: Option<ByteString>,
    id: OnceCell<String>,
    timestamp: OnceCell<i64>,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("uploads", &self.uploads)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl Payload {
    /// Start building a payload.
    pub fn builder() -> PayloadBuilder {
        PayloadBuilder {
            headers: Headers::new(),
            data: Value::Null,
            uploads: None,
            url: None,
            method: None,
            id: None,
            timestamp: None,
            entropy: Arc::new(OsEntropy),
            clock: Arc::new(SystemClock),
        }
    }

    /// The headers map.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The request data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The upload manifest, if any.
    pub fn uploads(&self) -> Option<&Uploads> {
        self.uploads.as_ref()
    }

    /// The request URL, if any.
    pub fn url(&self) -> Option<&ByteString> {
        self.url.as_ref()
    }

    /// The HTTP method, lowercased, if any.
    pub fn method(&self) -> Option<ByteString> {
        self.method.as_ref().map(ByteString::to_ascii_lowercase)
    }

    /// The payload id as 64 lowercase hex characters, generating it from
    /// the entropy source on first access.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Crypto`] if the entropy source fails. No id is
    /// memoized in that case; a later call may still succeed.
    pub fn id(&self) -> Result<&str> {
        if let Some(id) = self.id.get() {
            return Ok(id);
        }
        let bytes = self.entropy.random_bytes(ID_LENGTH)?;
        Ok(self.id.get_or_init(|| hex::encode(bytes)))
    }

    /// The payload timestamp, reading the clock on first access.
    pub fn timestamp(&self) -> i64 {
        *self.timestamp.get_or_init(|| self.clock.now())
    }

    /// Render the payload as its JSON wire form, with the string
    /// transform applied to headers, data, url, and method. The id,
    /// timestamp, and upload manifest travel untransformed.
    pub fn to_wire_text(&self) -> Result<String> {
        let mut object = JsonMap::new();
        object.insert("id".to_owned(), JsonValue::String(self.id()?.to_owned()));
        object.insert("timestamp".to_owned(), JsonValue::from(self.timestamp()));
        object.insert("headers".to_owned(), headers_to_safe(&self.headers)?);
        object.insert("data".to_owned(), codec::value_to_safe(&self.data, 2)?);
        object.insert("uploads".to_owned(), uploads_to_wire(self.uploads.as_ref())?);
        object.insert("url".to_owned(), optional_string_to_safe(self.url.as_ref()));
        object.insert(
            "method".to_owned(),
            optional_string_to_safe(self.method().as_ref()),
        );
        serde_json::to_string(&JsonValue::Object(object))
            .map_err(|e| ProtocolError::EncodingFailure(e.to_string()))
    }

    /// Rebuild a payload from decrypted wire text, validating every
    /// field as if it came straight from a caller.
    pub fn from_wire_text(text: &str) -> Result<Payload> {
        let object = codec::decode_object_exact(text, &WIRE_FIELDS)?;

        let id = match &object["id"] {
            JsonValue::String(id) => {
                validate::ensure_hex(id, Some(2 * ID_LENGTH))?;
                id.clone()
            }
            _ => return Err(ProtocolError::InvalidData("id must be a hex string")),
        };

        let timestamp = object["timestamp"]
            .as_i64()
            .ok_or(ProtocolError::InvalidTimestamp)?;

        let headers = headers_from_safe(&object["headers"])?;
        let data = codec::value_from_safe(&object["data"])?;
        let uploads = uploads_from_wire(&object["uploads"])?;
        let url = optional_string_from_safe(&object["url"])?;
        let method = optional_string_from_safe(&object["method"])?;

        Ok(Payload {
            headers,
            data,
            uploads,
            url,
            method,
            id: prefilled(Some(id)),
            timestamp: prefilled(Some(timestamp)),
            entropy: Arc::new(OsEntropy),
            clock: Arc::new(SystemClock),
        })
    }
}

/// Builder for [`Payload`]. All validation happens in [`build`], so a
/// successfully built payload is always sealable.
///
/// [`build`]: PayloadBuilder::build
pub struct PayloadBuilder {
    headers: Headers,
    data: Value,
    uploads: Option<Uploads>,
    url: Option<ByteString>,
    method: Option<ByteString>,
    id: Option<String>,
    timestamp: Option<i64>,
    entropy: Arc<dyn EntropySource>,
    clock: Arc<dyn Clock>,
}

impl PayloadBuilder {
    /// Set the headers map.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request data.
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    /// Attach an upload manifest.
    pub fn uploads(mut self, uploads: Uploads) -> Self {
        self.uploads = Some(uploads);
        self
    }

    /// Set the request URL.
    pub fn url(mut self, url: impl Into<ByteString>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: impl Into<ByteString>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Force the payload id instead of generating one. Must be 64
    /// lowercase hex characters.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Force the payload timestamp instead of reading the clock.
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Replace the entropy source used for lazy id generation.
    pub fn entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    /// Replace the clock used for lazy timestamp assignment.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate everything and produce the payload.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::CircularReferences`] for cyclic data,
    /// [`ProtocolError::InvalidArrayFormat`] for malformed headers or
    /// upload descriptors, [`ProtocolError::InvalidData`] for malformed
    /// hex fields.
    pub fn build(self) -> Result<Payload> {
        validate::ensure_acyclic(&self.data)?;
        validate::ensure_header_values(&self.headers)?;
        if let Some(id) = &self.id {
            validate::ensure_hex(id, Some(2 * ID_LENGTH))?;
        }
        if let Some(uploads) = &self.uploads {
            for entry in uploads.values() {
                ensure_upload_entry(entry)?;
            }
        }
        Ok(Payload {
            headers: self.headers,
            data: self.data,
            uploads: self.uploads,
            url: self.url,
            method: self.method,
            id: prefilled(self.id),
            timestamp: prefilled(self.timestamp),
            entropy: self.entropy,
            clock: self.clock,
        })
    }
}

fn prefilled<T>(value: Option<T>) -> OnceCell<T> {
    let cell = OnceCell::new();
    if let Some(value) = value {
        let _ = cell.set(value);
    }
    cell
}

fn ensure_upload_entry(entry: &UploadEntry) -> Result<()> {
    match entry {
        UploadEntry::Hash(hash) => {
            validate::ensure_hex(hash, Some(2 * UPLOAD_HASH_LENGTH))?;
        }
        UploadEntry::Descriptor(descriptor) => {
            validate::ensure_hex(&descriptor.signature, Some(2 * UPLOAD_HASH_LENGTH))?;
            if descriptor.filename.as_str().is_none() || descriptor.name.as_str().is_none() {
                return Err(ProtocolError::InvalidData(
                    "upload descriptor fields must be valid utf-8",
                ));
            }
        }
    }
    Ok(())
}

fn headers_to_safe(headers: &Headers) -> Result<JsonValue> {
    let mut object = JsonMap::new();
    for (name, values) in headers {
        let list = values
            .iter()
            .map(|value| codec::value_to_safe(value, 3))
            .collect::<Result<Vec<_>>>()?;
        object.insert(codec::to_transmittable(name.as_bytes()), JsonValue::Array(list));
    }
    Ok(JsonValue::Object(object))
}

fn headers_from_safe(json: &JsonValue) -> Result<Headers> {
    let JsonValue::Object(object) = json else {
        return Err(ProtocolError::UnsupportedVariableType);
    };
    let mut headers = Headers::new();
    for (name, values) in object {
        let JsonValue::Array(items) = values else {
            return Err(ProtocolError::InvalidArrayFormat(
                "header values must be a list",
            ));
        };
        let mut list = Vec::with_capacity(items.len());
        for item in items {
            if matches!(item, JsonValue::Array(_) | JsonValue::Object(_)) {
                return Err(ProtocolError::InvalidArrayFormat(
                    "header values must be scalars",
                ));
            }
            list.push(codec::value_from_safe(item)?);
        }
        headers.insert(codec::from_transmittable(name)?, list);
    }
    Ok(headers)
}

fn optional_string_to_safe(value: Option<&ByteString>) -> JsonValue {
    match value {
        Some(s) => JsonValue::String(codec::to_transmittable(s.as_bytes())),
        None => JsonValue::Null,
    }
}

fn optional_string_from_safe(json: &JsonValue) -> Result<Option<ByteString>> {
    match json {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(codec::from_transmittable(s)?)),
        _ => Err(ProtocolError::UnsupportedVariableType),
    }
}

fn uploads_to_wire(uploads: Option<&Uploads>) -> Result<JsonValue> {
    let Some(uploads) = uploads else {
        return Ok(JsonValue::Null);
    };
    let mut object = JsonMap::new();
    for (key, entry) in uploads {
        let value = match entry {
            UploadEntry::Hash(hash) => JsonValue::String(hash.clone()),
            UploadEntry::Descriptor(descriptor) => {
                let mut record = JsonMap::new();
                record.insert(
                    "filename".to_owned(),
                    JsonValue::String(bare_utf8(&descriptor.filename)?),
                );
                record.insert(
                    "name".to_owned(),
                    JsonValue::String(bare_utf8(&descriptor.name)?),
                );
                record.insert(
                    "signature".to_owned(),
                    JsonValue::String(descriptor.signature.clone()),
                );
                JsonValue::Object(record)
            }
        };
        object.insert(bare_utf8(key)?, value);
    }
    Ok(JsonValue::Object(object))
}

fn bare_utf8(s: &ByteString) -> Result<String> {
    s.as_str()
        .map(str::to_owned)
        .ok_or_else(|| ProtocolError::EncodingFailure("upload field is not valid utf-8".to_owned()))
}

fn uploads_from_wire(json: &JsonValue) -> Result<Option<Uploads>> {
    let object = match json {
        JsonValue::Null => return Ok(None),
        JsonValue::Object(object) => object,
        _ => return Err(ProtocolError::UnsupportedVariableType),
    };
    let mut uploads = Uploads::new();
    for (key, value) in object {
        let entry = match value {
            JsonValue::String(hash) => {
                validate::ensure_hex(hash, Some(2 * UPLOAD_HASH_LENGTH))?;
                UploadEntry::Hash(hash.clone())
            }
            JsonValue::Object(record) => descriptor_from_wire(record)?,
            _ => return Err(ProtocolError::UnsupportedVariableType),
        };
        uploads.insert(ByteString::from(key.as_str()), entry);
    }
    Ok(Some(uploads))
}

fn descriptor_from_wire(record: &JsonMap<String, JsonValue>) -> Result<UploadEntry> {
    let present: BTreeSet<&str> = record.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = DESCRIPTOR_FIELDS.iter().copied().collect();
    if present != expected {
        return Err(ProtocolError::InvalidArrayFormat(
            "upload descriptor must carry filename, name and signature",
        ));
    }
    let field = |name: &str| -> Result<&str> {
        record[name]
            .as_str()
            .ok_or(ProtocolError::UnsupportedVariableType)
    };
    let signature = field("signature")?;
    validate::ensure_hex(signature, Some(2 * UPLOAD_HASH_LENGTH))?;
    Ok(UploadEntry::Descriptor(UploadDescriptor {
        filename: ByteString::from(field("filename")?),
        name: ByteString::from(field("name")?),
        signature: signature.to_owned(),
    }))
}

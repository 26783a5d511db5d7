//! Binary-safe JSON encoding.
//!
//! JSON strings must be valid UTF-8, but payload strings are arbitrary
//! bytes. Strings therefore travel with a one-character prefix: `u`
//! followed by the bytes verbatim when they are valid UTF-8, or `b`
//! followed by their base64 encoding otherwise. The transform applies to
//! map keys as well as string values.
//!
//! Untrusted input is depth-checked with a linear scan before parsing so
//! a hostile document cannot exhaust the stack, and decoded objects are
//! checked against an exact key set so unknown fields are rejected
//! rather than ignored.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeSet;

use crate::limits::MAX_NESTING_DEPTH;
use crate::value::{ByteString, Value};
use crate::{ProtocolError, Result};

/// Encode raw bytes as a prefixed, JSON-safe string.
pub fn to_transmittable(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => format!("u{text}"),
        Err(_) => format!("b{}", BASE64.encode(bytes)),
    }
}

/// Decode a prefixed string back to its raw bytes.
///
/// # Errors
///
/// [`ProtocolError::InvalidData`] if the prefix is missing or unknown,
/// or the base64 remainder is malformed.
pub fn from_transmittable(text: &str) -> Result<ByteString> {
    match text.as_bytes().first() {
        Some(b'u') => Ok(ByteString::from(&text.as_bytes()[1..])),
        Some(b'b') => BASE64
            .decode(&text.as_bytes()[1..])
            .map(ByteString::from)
            .map_err(|_| ProtocolError::InvalidData("malformed base64 string")),
        _ => Err(ProtocolError::InvalidData("missing string transport prefix")),
    }
}

/// Convert a payload value into its JSON wire form, applying the string
/// transform to every string value and map key.
///
/// `depth` is the nesting level this value occupies in the final
/// document (the payload object itself is level 1).
///
/// # Errors
///
/// [`ProtocolError::EncodingFailure`] if nesting exceeds
/// [`MAX_NESTING_DEPTH`] or a float is not finite.
pub fn value_to_safe(value: &Value, depth: usize) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| ProtocolError::EncodingFailure("non-finite float".to_owned()))?,
        Value::Str(s) => JsonValue::String(to_transmittable(s.as_bytes())),
        Value::List(list) => {
            ensure_depth(depth)?;
            let items = list
                .borrow()
                .iter()
                .map(|item| value_to_safe(item, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            JsonValue::Array(items)
        }
        Value::Map(map) => {
            ensure_depth(depth)?;
            let mut object = JsonMap::new();
            for (key, item) in map.borrow().iter() {
                object.insert(
                    to_transmittable(key.as_bytes()),
                    value_to_safe(item, depth + 1)?,
                );
            }
            JsonValue::Object(object)
        }
    })
}

fn ensure_depth(depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ProtocolError::EncodingFailure(format!(
            "nesting exceeds {MAX_NESTING_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Convert a decoded JSON value back into a payload value, reversing the
/// string transform on values and map keys.
pub fn value_from_safe(json: &JsonValue) -> Result<Value> {
    Ok(match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => number_to_value(n)?,
        JsonValue::String(s) => Value::Str(from_transmittable(s)?),
        JsonValue::Array(items) => {
            Value::list(items.iter().map(value_from_safe).collect::<Result<Vec<_>>>()?)
        }
        JsonValue::Object(object) => {
            let mut map = IndexMap::new();
            for (key, item) in object {
                map.insert(from_transmittable(key)?, value_from_safe(item)?);
            }
            Value::Map(std::rc::Rc::new(std::cell::RefCell::new(map)))
        }
    })
}

fn number_to_value(number: &serde_json::Number) -> Result<Value> {
    if let Some(i) = number.as_i64() {
        Ok(Value::Int(i))
    } else if let Some(f) = number.as_f64() {
        Ok(Value::Float(f))
    } else {
        Err(ProtocolError::InvalidData("unrepresentable number"))
    }
}

/// Reject documents nested deeper than [`MAX_NESTING_DEPTH`] before they
/// reach the recursive parser.
///
/// A linear scan that counts brackets outside JSON string literals. It
/// over-approximates on malformed input, which is fine: malformed input
/// fails in the parser anyway.
pub fn ensure_nesting_budget(text: &str) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(ProtocolError::InvalidData("nesting too deep"));
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Parse `text` as a JSON object whose key set is exactly
/// `expected_keys`, in any order.
///
/// The parser's own recursion limit is lifted because depth is enforced
/// up front by [`ensure_nesting_budget`].
pub fn decode_object_exact(
    text: &str,
    expected_keys: &[&str],
) -> Result<JsonMap<String, JsonValue>> {
    ensure_nesting_budget(text)?;

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = JsonValue::deserialize(&mut deserializer)
        .map_err(|_| ProtocolError::InvalidData("malformed json"))?;
    deserializer
        .end()
        .map_err(|_| ProtocolError::InvalidData("malformed json"))?;

    let JsonValue::Object(object) = value else {
        return Err(ProtocolError::InvalidData("expected a json object"));
    };

    let present: BTreeSet<&str> = object.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = expected_keys.iter().copied().collect();
    if present != expected {
        return Err(ProtocolError::InvalidData("unexpected key set"));
    }

    Ok(object)
}

//! The structured value model carried inside payloads.
//!
//! Values mirror what JSON can express, with two deliberate differences:
//! strings are byte strings (arbitrary bytes, not necessarily UTF-8), and
//! containers are shared mutable cells so aliased and cyclic structures
//! are representable. Cycles are rejected at validation time, not made
//! unrepresentable; see [`crate::validate::ensure_acyclic`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// An owned byte string. Holds arbitrary bytes; UTF-8 content is the
/// common case but never required.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    /// Create a byte string from anything convertible to bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// View as `&str` if the content is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy with ASCII letters lowercased.
    pub fn to_ascii_lowercase(&self) -> Self {
        Self(self.0.to_ascii_lowercase())
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for ByteString {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

/// A shared list container.
pub type ValueList = Rc<RefCell<Vec<Value>>>;

/// A shared map container with insertion-ordered byte-string keys.
pub type ValueMap = Rc<RefCell<IndexMap<ByteString, Value>>>;

/// Header map: ordered header names, each with an ordered list of scalar
/// values.
pub type Headers = IndexMap<ByteString, Vec<Value>>;

/// A payload value.
///
/// Comparison is deep and structural. Comparing a cyclic value recurses
/// forever, so values must pass cycle validation before being compared.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Byte string.
    Str(ByteString),
    /// Ordered list of values.
    List(ValueList),
    /// Ordered map of byte-string keys to values.
    Map(ValueMap),
}

impl Value {
    /// A list value from owned items.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// A map value from key/value pairs, preserving iteration order.
    pub fn map<K: Into<ByteString>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect::<IndexMap<_, _>>();
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// A string value.
    pub fn string(s: impl Into<ByteString>) -> Self {
        Value::Str(s.into())
    }

    /// Whether this value is a scalar (anything but a list or a map).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Str(v.into())
    }
}

impl From<ByteString> for Value {
    fn from(v: ByteString) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_string_utf8_view() {
        assert_eq!(ByteString::from("hello").as_str(), Some("hello"));
        assert_eq!(ByteString::from(&[0xffu8, 0xfe]).as_str(), None);
    }

    #[test]
    fn test_byte_string_lowercase() {
        let s = ByteString::from("X-Custom-HEADER");
        assert_eq!(s.to_ascii_lowercase().as_bytes(), b"x-custom-header");
    }

    #[test]
    fn test_scalar_classification() {
        assert!(Value::Null.is_scalar());
        assert!(Value::from(1).is_scalar());
        assert!(Value::from(1.5).is_scalar());
        assert!(Value::from("x").is_scalar());
        assert!(!Value::list(vec![]).is_scalar());
        assert!(!Value::map(Vec::<(&str, Value)>::new()).is_scalar());
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::map([("k", Value::list(vec![Value::from(1), Value::Null]))]);
        let b = Value::map([("k", Value::list(vec![Value::from(1), Value::Null]))]);
        let c = Value::map([("k", Value::list(vec![Value::from(2), Value::Null]))]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let value = Value::map([("z", Value::from(1)), ("a", Value::from(2))]);
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        let keys: Vec<ByteString> = map.borrow().keys().cloned().collect();
        assert_eq!(keys, vec![ByteString::from("z"), ByteString::from("a")]);
    }
}

//! Structural validation of payload fields before encoding.

use std::rc::Rc;

use crate::value::{Headers, Value};
use crate::{ProtocolError, Result};

/// Fail with [`ProtocolError::CircularReferences`] if any container in
/// `value` appears within its own ancestry.
///
/// Tracks the chain of container identities (by shared-cell pointer) on
/// the current descent path only, so a container referenced from two
/// sibling positions is fine; only true cycles are rejected.
pub fn ensure_acyclic(value: &Value) -> Result<()> {
    let mut ancestry = Vec::new();
    walk(value, &mut ancestry)
}

fn walk(value: &Value, ancestry: &mut Vec<usize>) -> Result<()> {
    match value {
        Value::List(list) => {
            let id = Rc::as_ptr(list) as usize;
            if ancestry.contains(&id) {
                return Err(ProtocolError::CircularReferences);
            }
            ancestry.push(id);
            for item in list.borrow().iter() {
                walk(item, ancestry)?;
            }
            ancestry.pop();
        }
        Value::Map(map) => {
            let id = Rc::as_ptr(map) as usize;
            if ancestry.contains(&id) {
                return Err(ProtocolError::CircularReferences);
            }
            ancestry.push(id);
            for item in map.borrow().values() {
                walk(item, ancestry)?;
            }
            ancestry.pop();
        }
        _ => {}
    }
    Ok(())
}

/// Headers must map names to flat lists of scalar values.
pub fn ensure_header_values(headers: &Headers) -> Result<()> {
    for values in headers.values() {
        for value in values {
            ensure_acyclic(value)?;
            if !value.is_scalar() {
                return Err(ProtocolError::InvalidArrayFormat(
                    "header values must be scalars",
                ));
            }
        }
    }
    Ok(())
}

/// Require `text` to be non-empty lowercase hex.
///
/// With `expected_len` the character count must match exactly; without
/// it the count must merely be even (whole bytes).
pub fn ensure_hex(text: &str, expected_len: Option<usize>) -> Result<()> {
    let well_formed = !text.is_empty()
        && text
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    let length_ok = match expected_len {
        Some(len) => text.len() == len,
        None => text.len() % 2 == 0,
    };
    if !well_formed || !length_ok {
        return Err(ProtocolError::InvalidData("malformed hex field"));
    }
    Ok(())
}

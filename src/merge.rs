//! # Deep Merge Module
//!
//! Recursive merge of JSON-shaped argument maps.
//!
//! ## Overview
//!
//! The bus composes the arguments delivered to a handler from three layers
//! (caller-supplied args, captured path parameters, reserved keys) and the
//! external configuration loader composes file/environment layers the same
//! way. Both go through [`deep_merge`].
//!
//! ## Merge Contract
//!
//! - If both sides at a key hold JSON objects, merge recursively.
//! - Otherwise the right-hand side wins wholesale.
//! - Arrays are opaque: replaced, never concatenated.
//! - `null` is not an object; it wins or loses like any other scalar.
//! - Inputs are never mutated; the result is a new value.
//!
//! Cycles cannot occur in `serde_json::Value`, so depth is bounded by the
//! input structure.

use serde_json::Value;

/// Merge `overlay` onto `base`, returning a new value.
///
/// Only object-vs-object pairs merge recursively; any other pairing
/// resolves to a clone of `overlay`.
///
/// # Example
///
/// ```rust
/// use pathbus::merge::deep_merge;
/// use serde_json::json;
///
/// let base = json!({"db": {"host": "a", "port": 1}, "tags": [1]});
/// let overlay = json!({"db": {"port": 2}, "tags": [2, 3]});
/// let merged = deep_merge(&base, &overlay);
/// assert_eq!(merged, json!({"db": {"host": "a", "port": 2}, "tags": [2, 3]}));
/// ```
#[must_use]
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(lhs), Value::Object(rhs)) => {
            let mut out = lhs.clone();
            for (key, value) in rhs {
                let merged = match lhs.get(key) {
                    Some(existing @ Value::Object(_)) if value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

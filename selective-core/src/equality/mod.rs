//! Shallow Equality
//!
//! The comparator decides whether a freshly derived slice is "the same" as
//! the cached one. It is deliberately shallow: one level of structure is
//! inspected and anything nested is compared by identity.
//!
//! # Rules
//!
//! Applied in order, first match wins:
//!
//! 1. Identical values are equal: primitives by value, functions and
//!    compounds by allocation. NaN equals NaN; the sign of zero is ignored.
//! 2. A null-like or non-compound operand that failed (1) is unequal.
//! 3. Dates compare timestamps.
//! 4. Patterns compare source text and flags.
//! 5. Maps: same size, every key present with an identical value.
//! 6. Sets: same size, every member present.
//! 7. Arrays and objects: same number of keys, every key present with an
//!    identical value.
//!
//! Compounds of different shapes are unequal.
//!
//! For dynamic state the rules are dispatched over the [`Value`] shapes by
//! [`shallow_equal`]. Typed slices get the same rules through the
//! [`ShallowEq`] and [`SameValue`] traits.

mod shallow;
mod value;

pub use shallow::{SameValue, ShallowEq};
pub use value::{Callable, Date, Key, Number, Pattern, Value};

use std::sync::Arc;

/// Rule (1): identity or primitive equality.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x.same_value(y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
        (Value::Date(x), Value::Date(y)) => Arc::ptr_eq(x, y),
        (Value::Pattern(x), Value::Pattern(y)) => Arc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
        (Value::Set(x), Value::Set(y)) => Arc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// The default comparator for dynamic slices.
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    if same_value(a, b) {
        return true;
    }

    if !a.is_compound() || !b.is_compound() {
        return false;
    }

    match (a, b) {
        (Value::Date(x), Value::Date(y)) => x.millis() == y.millis(),
        (Value::Pattern(x), Value::Pattern(y)) => x.source() == y.source() && x.flags() == y.flags(),
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| same_value(v, w)))
        }
        (Value::Set(x), Value::Set(y)) => {
            x.len() == y.len() && x.iter().all(|k| y.contains(k))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(v, w)| same_value(v, w))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| same_value(v, w)))
        }
        // Shapes never match across kinds, so `[1]` and `{"0": 1}` differ.
        _ => false,
    }
}

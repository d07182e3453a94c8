//! Runtime state model for the interpreter
//!
//! - [`value`]: Runtime value representation (Integer, Float, String, Boolean, Array)
//! - [`stack`]: Chained scopes holding declared symbols
//!
//! # Type compatibility
//!
//! A value may be stored into a symbol only when its type tag matches the
//! declared type exactly. There is no implicit widening: an Integer is not
//! accepted where a Float is declared, and arrays accept only elements of
//! their declared element type.

pub mod stack;
pub mod value;

use value::{Value, ValueType};

/// True when `value` may be stored into a scalar declared as `target`.
pub fn is_compatible(target: ValueType, value: &Value) -> bool {
    value.value_type() == target
}

/// True when every element of `items` fits an array of `element` values.
pub fn elements_compatible(element: ValueType, items: &[Value]) -> bool {
    items.iter().all(|item| is_compatible(element, item))
}

//! Runtime value representation
//!
//! This module defines the [`Value`] enum, the closed set of shapes a dinein
//! program can compute with, and [`ValueType`], the type tag used for
//! compatibility checks.
//!
//! # Value Types
//!
//! - [`Value::Integer`]: `pinch`, kept within the 9-digit literal range
//! - [`Value::Float`]: `skim`
//! - [`Value::String`]: `pasta`
//! - [`Value::Boolean`]: `bool` (`yum` / `bleh`)
//! - [`Value::Array`]: `recipe` of one element type

use std::fmt;

/// Runtime values in the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Array(Vec<Value>),
}

/// Type tag of a value or declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Boolean,
    Array,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "pinch",
            ValueType::Float => "skim",
            ValueType::String => "pasta",
            ValueType::Boolean => "bool",
            ValueType::Array => "recipe",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Array(_) => ValueType::Array,
        }
    }

    /// Zero value of a scalar type, used to fill arrays declared without elements
    pub fn default_for(value_type: ValueType) -> Value {
        match value_type {
            ValueType::Integer => Value::Integer(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Array => Value::Array(Vec::new()),
        }
    }

    /// Get the integer value, returns None if not an Integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean value, returns None if not a Boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view, promoting Integer to Float
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

/// Float rendering with at least one fractional digit
fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("yum"),
            Value::Boolean(false) => f.write_str("bleh"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-5).to_string(), "-5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Boolean(true).to_string(), "yum");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Integer(3).as_number(), Some(3.0));
        assert_eq!(Value::String("3".into()).as_number(), None);
        assert!(Value::Float(0.5).is_numeric());
        assert!(!Value::Boolean(false).is_numeric());
    }
}

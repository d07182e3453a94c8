//! Type checks at storage boundaries
//!
//! Values are checked when they are stored, never when they are computed:
//!
//! - declaration initialisers and array element lists
//! - assignments, including compound ones and element stores
//! - argument binding and typed function results
//! - raw text read by `make`
//!
//! The compatibility rule itself lives in [`crate::memory::is_compatible`].

use std::ops::RangeInclusive;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::is_compatible;
use crate::memory::value::{Value, ValueType};

impl Interpreter<'_> {
    /// Check `value` against a declared type, reporting a mismatch described
    /// by `context` (e.g. "assignment to 'x'").
    pub(crate) fn check_assignable(
        &mut self,
        target: ValueType,
        value: Value,
        context: &str,
        line: usize,
        identifier: &str,
    ) -> Option<Value> {
        if is_compatible(target, &value) {
            return Some(value);
        }
        self.diagnostics.report(
            DiagnosticKind::TypeMismatch,
            format!(
                "Type mismatch in {}: cannot assign '{}' to '{}'",
                context,
                value.value_type(),
                target
            ),
            line,
            Some(identifier),
        );
        None
    }

    /// Report an Integer result outside the configured range.
    pub(crate) fn check_integer_range(&mut self, n: i64, line: usize) -> Option<Value> {
        if self.config.integer_range.contains(&n) {
            return Some(Value::Integer(n));
        }
        self.diagnostics.report(
            DiagnosticKind::ArithmeticOverflow,
            format!(
                "Integer result {} is outside the range {}..={}",
                n,
                self.config.integer_range.start(),
                self.config.integer_range.end()
            ),
            line,
            None,
        );
        None
    }
}

/// Parse raw input for a scalar of type `target`.
///
/// Integers must fall in `range`; Booleans are spelled `yum` / `bleh`;
/// Strings are taken verbatim.
pub(crate) fn parse_input(target: ValueType, raw: &str, range: &RangeInclusive<i64>) -> Option<Value> {
    let trimmed = raw.trim();
    match target {
        ValueType::Integer => trimmed
            .parse::<i64>()
            .ok()
            .filter(|n| range.contains(n))
            .map(Value::Integer),
        ValueType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Float),
        ValueType::String => Some(Value::String(raw.to_string())),
        ValueType::Boolean => match trimmed {
            "yum" => Some(Value::Boolean(true)),
            "bleh" => Some(Value::Boolean(false)),
            _ => None,
        },
        ValueType::Array => None,
    }
}

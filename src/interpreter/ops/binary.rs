use std::cmp::Ordering;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::value::Value;
use crate::parser::ast::BinaryOp;

impl Interpreter<'_> {
    /// Apply a binary operator to two already evaluated operands.
    pub(crate) fn binary_op(&mut self, op: BinaryOp, left: Value, right: Value, line: usize) -> Option<Value> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.arithmetic(op, left, right, line)
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                let equal = self.values_equal(op, &left, &right, line)?;
                Some(Value::Boolean(if op == BinaryOp::Equal { equal } else { !equal }))
            }
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                let ordering = self.compare(op, &left, &right, line)?;
                let result = match op {
                    BinaryOp::Less => ordering == Ordering::Less,
                    BinaryOp::Greater => ordering == Ordering::Greater,
                    BinaryOp::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Some(Value::Boolean(result))
            }
            BinaryOp::And | BinaryOp::Or => match (&left, &right) {
                // Both sides are always evaluated
                (Value::Boolean(a), Value::Boolean(b)) => Some(Value::Boolean(if op == BinaryOp::And {
                    *a && *b
                } else {
                    *a || *b
                })),
                _ => self.invalid_operands(op, &left, &right, line),
            },
        }
    }

    fn arithmetic(&mut self, op: BinaryOp, left: Value, right: Value, line: usize) -> Option<Value> {
        match (left, right) {
            (Value::String(mut a), Value::String(b)) if op == BinaryOp::Add => {
                a.push_str(&b);
                Some(Value::String(a))
            }
            (Value::Integer(a), Value::Integer(b)) => self.integer_arithmetic(op, a, b, line),
            (left, right) => match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => self.float_arithmetic(op, a, b, line),
                _ => self.invalid_operands(op, &left, &right, line),
            },
        }
    }

    fn integer_arithmetic(&mut self, op: BinaryOp, a: i64, b: i64, line: usize) -> Option<Value> {
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
            return self.division_by_zero(op, line);
        }
        // Division truncates toward zero
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        match result {
            Some(n) => self.check_integer_range(n, line),
            None => {
                self.diagnostics.report(
                    DiagnosticKind::ArithmeticOverflow,
                    format!("Arithmetic overflow in {} {} {}", a, op, b),
                    line,
                    None,
                );
                None
            }
        }
    }

    fn float_arithmetic(&mut self, op: BinaryOp, a: f64, b: f64, line: usize) -> Option<Value> {
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0.0 {
            return self.division_by_zero(op, line);
        }
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => a % b,
        };
        if !result.is_finite() {
            self.diagnostics.report(
                DiagnosticKind::ArithmeticOverflow,
                format!("Arithmetic overflow in {} {} {}", a, op, b),
                line,
                None,
            );
            return None;
        }
        Some(Value::Float(result))
    }

    fn values_equal(&mut self, op: BinaryOp, left: &Value, right: &Value, line: usize) -> Option<bool> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Some(a == b),
            (l, r) if l.is_numeric() && r.is_numeric() => Some(l.as_number() == r.as_number()),
            (l, r) if l.value_type() == r.value_type() => Some(l == r),
            _ => {
                self.invalid_operands(op, left, right, line);
                None
            }
        }
    }

    fn compare(&mut self, op: BinaryOp, left: &Value, right: &Value, line: usize) -> Option<Ordering> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (l, r) => match (l.as_number(), r.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => {
                    self.invalid_operands(op, left, right, line);
                    None
                }
            },
        }
    }

    pub(crate) fn invalid_operands(&mut self, op: BinaryOp, left: &Value, right: &Value, line: usize) -> Option<Value> {
        self.diagnostics.report(
            DiagnosticKind::InvalidOperands,
            format!(
                "Operator '{}' cannot be applied to '{}' and '{}'",
                op,
                left.value_type(),
                right.value_type()
            ),
            line,
            None,
        );
        None
    }

    fn division_by_zero(&mut self, op: BinaryOp, line: usize) -> Option<Value> {
        self.diagnostics.report(
            DiagnosticKind::DivisionByZero,
            format!("Division by zero in '{}'", op),
            line,
            None,
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RunConfig;
    use crate::interpreter::engine::Interpreter;
    use crate::interpreter::errors::DiagnosticKind;
    use crate::interpreter::input::ScriptedInput;
    use crate::memory::value::Value;
    use crate::parser::ast::{BinaryOp, Program};

    fn empty_program() -> Program {
        Program {
            globals: Vec::new(),
            functions: Vec::new(),
            locals: Vec::new(),
            body: Vec::new(),
            exit_code: 0,
            exit_line: 1,
        }
    }

    #[test]
    fn test_integer_division_truncates() {
        let mut input = ScriptedInput::empty();
        let mut interp = Interpreter::new(empty_program(), RunConfig::default(), &mut input);
        assert_eq!(
            interp.binary_op(BinaryOp::Div, Value::Integer(7), Value::Integer(2), 1),
            Some(Value::Integer(3))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Div, Value::Integer(-7), Value::Integer(2), 1),
            Some(Value::Integer(-3))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Div, Value::Float(7.0), Value::Integer(2), 1),
            Some(Value::Float(3.5))
        );
    }

    #[test]
    fn test_division_by_zero_and_overflow() {
        let mut input = ScriptedInput::empty();
        let mut interp = Interpreter::new(empty_program(), RunConfig::default(), &mut input);
        assert_eq!(interp.binary_op(BinaryOp::Mod, Value::Integer(1), Value::Integer(0), 2), None);
        assert_eq!(interp.binary_op(BinaryOp::Div, Value::Float(1.0), Value::Float(0.0), 3), None);
        assert_eq!(
            interp.binary_op(BinaryOp::Mul, Value::Integer(999_999_999), Value::Integer(2), 4),
            None
        );

        let diagnostics = interp.diagnostics();
        assert_eq!(diagnostics.of_kind(DiagnosticKind::DivisionByZero).count(), 2);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::ArithmeticOverflow).count(), 1);
    }

    #[test]
    fn test_string_concatenation_rules() {
        let mut input = ScriptedInput::empty();
        let mut interp = Interpreter::new(empty_program(), RunConfig::default(), &mut input);
        assert_eq!(
            interp.binary_op(BinaryOp::Add, Value::String("ab".into()), Value::String("c".into()), 1),
            Some(Value::String("abc".into()))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Add, Value::String("n=".into()), Value::Integer(1), 1),
            None
        );
        assert_eq!(
            interp.diagnostics().of_kind(DiagnosticKind::InvalidOperands).count(),
            1
        );
    }

    #[test]
    fn test_comparisons_and_logic() {
        let mut input = ScriptedInput::empty();
        let mut interp = Interpreter::new(empty_program(), RunConfig::default(), &mut input);
        assert_eq!(
            interp.binary_op(BinaryOp::Less, Value::Integer(1), Value::Float(1.5), 1),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Equal, Value::Integer(2), Value::Float(2.0), 1),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Or, Value::Boolean(false), Value::Boolean(true), 1),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            interp.binary_op(BinaryOp::And, Value::Boolean(true), Value::Integer(1), 1),
            None
        );
        assert_eq!(
            interp.binary_op(BinaryOp::Equal, Value::String("a".into()), Value::Boolean(true), 1),
            None
        );
        assert!(!interp.diagnostics().is_empty());
    }
}

//! Expression evaluation
//!
//! Every evaluator returns `Option<Value>`. `None` means a diagnostic has
//! already been recorded and the enclosing expression should be abandoned;
//! callers never report a second error for the same fault.
//!
//! Both operands of a binary operator are evaluated before either is
//! inspected, so faults on the right-hand side are reported even when the
//! left-hand side failed. There is no short-circuiting for `&&` or `??`.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::stack::SymbolKind;
use crate::memory::value::Value;
use crate::parser::ast::Expr;

impl Interpreter<'_> {
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Literal { value, .. } => Some(value.to_value()),

            Expr::Variable { name, line } => self.read_variable(name, *line),

            Expr::Element { name, index, line } => self.read_element(name, *index, *line),

            Expr::Call { name, args, line } => self.call_for_value(name, args, *line),

            Expr::Binary { op, left, right, line } => {
                let left = self.evaluate(left);
                let right = self.evaluate(right);
                self.binary_op(*op, left?, right?, *line)
            }

            Expr::Not { operand, line } => {
                let value = self.evaluate(operand)?;
                self.logical_unary(value, true, *line)
            }

            Expr::DoubleNot { operand, line } => {
                let value = self.evaluate(operand)?;
                self.logical_unary(value, false, *line)
            }
        }
    }

    /// Evaluate a branch or loop condition. Anything but a Boolean counts as false.
    pub(crate) fn evaluate_condition(&mut self, condition: &Expr) -> bool {
        match self.evaluate(condition) {
            Some(Value::Boolean(b)) => b,
            Some(other) => {
                self.diagnostics.report(
                    DiagnosticKind::InvalidCondition,
                    format!(
                        "Condition must evaluate to a 'bool', got '{}'",
                        other.value_type()
                    ),
                    condition.line(),
                    None,
                );
                false
            }
            None => false,
        }
    }

    pub(crate) fn read_variable(&mut self, name: &str, line: usize) -> Option<Value> {
        let Some(symbol) = self.scopes.lookup(name, true) else {
            self.report_undeclared(name, line);
            return None;
        };
        if symbol.is_function() {
            self.diagnostics.report(
                DiagnosticKind::TypeMismatch,
                format!("Function '{}' cannot be used as a value without calling it", name),
                line,
                Some(name),
            );
            return None;
        }
        match symbol.value.clone() {
            Some(value) => Some(value),
            None => {
                self.report_unset(name, line);
                None
            }
        }
    }

    pub(crate) fn read_element(&mut self, name: &str, index: i64, line: usize) -> Option<Value> {
        let Some(symbol) = self.scopes.lookup(name, true) else {
            self.report_undeclared(name, line);
            return None;
        };
        let SymbolKind::Array { dimension, .. } = symbol.kind else {
            self.diagnostics.report(
                DiagnosticKind::NotAnArray,
                format!("'{}' is not an array", name),
                line,
                Some(name),
            );
            return None;
        };
        let element = match &symbol.value {
            Some(Value::Array(items)) => usize::try_from(index).ok().and_then(|i| items.get(i).cloned()),
            _ => None,
        };
        if element.is_none() {
            self.report_out_of_bounds(name, index, dimension, line);
        }
        element
    }

    pub(crate) fn report_undeclared(&mut self, name: &str, line: usize) {
        self.diagnostics.report(
            DiagnosticKind::UndeclaredIdentifier,
            format!("Undeclared identifier '{}'", name),
            line,
            Some(name),
        );
    }

    pub(crate) fn report_unset(&mut self, name: &str, line: usize) {
        self.diagnostics.report(
            DiagnosticKind::UnsetValue,
            format!("Variable '{}' is used before it is assigned a value", name),
            line,
            Some(name),
        );
    }

    pub(crate) fn report_out_of_bounds(&mut self, name: &str, index: i64, dimension: usize, line: usize) {
        self.diagnostics.report(
            DiagnosticKind::ArrayOutOfBounds,
            format!(
                "Index {} is out of bounds for array '{}' of size {}",
                index, name, dimension
            ),
            line,
            Some(name),
        );
    }
}

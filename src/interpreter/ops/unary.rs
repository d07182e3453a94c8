use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::stack::SymbolKind;
use crate::memory::value::Value;
use crate::parser::ast::{BinaryOp, StepOp};

impl Interpreter<'_> {
    /// `!` negates, `!!` passes through; both insist on a Boolean.
    pub(crate) fn logical_unary(&mut self, operand: Value, negate: bool, line: usize) -> Option<Value> {
        match operand {
            Value::Boolean(b) => Some(Value::Boolean(if negate { !b } else { b })),
            other => {
                self.diagnostics.report(
                    DiagnosticKind::InvalidOperands,
                    format!(
                        "Operator '{}' requires a 'bool' operand, got '{}'",
                        if negate { "!" } else { "!!" },
                        other.value_type()
                    ),
                    line,
                    None,
                );
                None
            }
        }
    }

    /// `x++` / `x--` on a numeric scalar. Returns false when nothing was stored.
    pub(crate) fn execute_step(&mut self, name: &str, op: StepOp, line: usize) -> bool {
        let Some(symbol) = self.scopes.lookup(name, true) else {
            self.report_undeclared(name, line);
            return false;
        };

        let (target, current) = match (&symbol.kind, &symbol.value) {
            (SymbolKind::Scalar(t), Some(v)) => (*t, v.clone()),
            (SymbolKind::Scalar(_), None) => {
                self.report_unset(name, line);
                return false;
            }
            (kind, _) => {
                let described = kind.describe();
                self.diagnostics.report(
                    DiagnosticKind::InvalidOperands,
                    format!("Operator '{}' cannot be applied to '{}' of type '{}'", step_symbol(op), name, described),
                    line,
                    Some(name),
                );
                return false;
            }
        };

        if !current.is_numeric() {
            self.diagnostics.report(
                DiagnosticKind::InvalidOperands,
                format!(
                    "Operator '{}' requires a numeric operand, got '{}'",
                    step_symbol(op),
                    current.value_type()
                ),
                line,
                Some(name),
            );
            return false;
        }

        let binary = match op {
            StepOp::Increment => BinaryOp::Add,
            StepOp::Decrement => BinaryOp::Sub,
        };
        let Some(next) = self.binary_op(binary, current, Value::Integer(1), line) else {
            return false;
        };
        let context = format!("update of '{}'", name);
        let Some(next) = self.check_assignable(target, next, &context, line, name) else {
            return false;
        };
        if let Some(symbol) = self.scopes.lookup_mut(name) {
            symbol.value = Some(next);
        }
        true
    }
}

fn step_symbol(op: StepOp) -> &'static str {
    match op {
        StepOp::Increment => "++",
        StepOp::Decrement => "--",
    }
}

//! `taste` / `elif` / `mix` and `flip` / `case` / `default`.
//!
//! At most one block runs, in its own branch scope. `flip` compares the
//! subject with each case literal by value; every case ends in `chop`, so
//! there is no fallthrough.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::stack::ScopeKind;
use crate::memory::value::Value;
use crate::parser::ast::{Branch, Case, Statement};

impl Interpreter<'_> {
    pub(crate) fn execute_if(&mut self, branches: &[Branch], otherwise: Option<&[Statement]>) {
        for branch in branches {
            if self.evaluate_condition(&branch.condition) {
                self.execute_block(&branch.body, ScopeKind::Branch);
                return;
            }
        }
        if let Some(body) = otherwise {
            self.execute_block(body, ScopeKind::Branch);
        }
    }

    pub(crate) fn execute_switch(&mut self, subject: &str, cases: &[Case], default: Option<&[Statement]>, line: usize) {
        let Some(value) = self.read_variable(subject, line) else {
            return;
        };

        for case in cases {
            let candidate = case.value.to_value();
            if !same_shape(&value, &candidate) {
                self.diagnostics.report(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "Case value {} does not match the type '{}' of '{}'",
                        candidate,
                        value.value_type(),
                        subject
                    ),
                    case.line,
                    Some(subject),
                );
                continue;
            }
            if candidate == value {
                self.execute_block(&case.body, ScopeKind::Branch);
                return;
            }
        }

        if let Some(body) = default {
            self.execute_block(body, ScopeKind::Branch);
        }
    }
}

fn same_shape(a: &Value, b: &Value) -> bool {
    a.value_type() == b.value_type()
}

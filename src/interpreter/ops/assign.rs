use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::elements_compatible;
use crate::memory::stack::SymbolKind;
use crate::memory::value::{Value, ValueType};
use crate::parser::ast::{AssignOp, Expr, Place};

/// Where an assignment will store, resolved before the value is combined
enum Slot {
    Scalar { target: ValueType, current: Option<Value> },
    WholeArray { element: ValueType, dimension: usize },
    Element { element: ValueType, index: usize, current: Value },
}

impl Interpreter<'_> {
    /// `target op value;`
    pub(crate) fn execute_assign(&mut self, target: &Place, op: AssignOp, value: &Expr, line: usize) {
        let rhs = self.evaluate(value);

        let name = target.name();
        let Some(slot) = self.resolve_slot(target, line) else {
            return;
        };
        let Some(rhs) = rhs else {
            return;
        };

        match slot {
            Slot::Scalar { target, current } => {
                let Some(next) = self.combine(op, current, rhs, name, line) else {
                    return;
                };
                let context = format!("assignment to '{}'", name);
                let Some(next) = self.check_assignable(target, next, &context, line, name) else {
                    return;
                };
                if let Some(symbol) = self.scopes.lookup_mut(name) {
                    symbol.value = Some(next);
                }
            }

            Slot::WholeArray { element, dimension } => {
                let fits = op == AssignOp::Assign
                    && matches!(&rhs, Value::Array(items) if items.len() == dimension && elements_compatible(element, items));
                if !fits {
                    self.diagnostics.report(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "Type mismatch in assignment to '{}': cannot assign '{}' to 'recipe {}[{}]'",
                            name,
                            rhs.value_type(),
                            element,
                            dimension
                        ),
                        line,
                        Some(name),
                    );
                    return;
                }
                if let Some(symbol) = self.scopes.lookup_mut(name) {
                    symbol.value = Some(rhs);
                }
            }

            Slot::Element { element, index, current } => {
                let Some(next) = self.combine(op, Some(current), rhs, name, line) else {
                    return;
                };
                let context = format!("assignment to '{}[{}]'", name, index);
                let Some(next) = self.check_assignable(element, next, &context, line, name) else {
                    return;
                };
                if let Some(symbol) = self.scopes.lookup_mut(name) {
                    if let Some(Value::Array(items)) = symbol.value.as_mut() {
                        items[index] = next;
                    }
                }
            }
        }
    }

    fn resolve_slot(&mut self, target: &Place, line: usize) -> Option<Slot> {
        let name = target.name();
        let Some(symbol) = self.scopes.lookup(name, true) else {
            self.diagnostics.report(
                DiagnosticKind::UndeclaredIdentifier,
                format!("Assignment to undeclared identifier '{}'", name),
                line,
                Some(name),
            );
            return None;
        };

        match (target, &symbol.kind) {
            (Place::Variable(_), SymbolKind::Scalar(t)) => Some(Slot::Scalar {
                target: *t,
                current: symbol.value.clone(),
            }),
            (Place::Variable(_), SymbolKind::Array { element, dimension }) => Some(Slot::WholeArray {
                element: *element,
                dimension: *dimension,
            }),
            (Place::Element { index, .. }, SymbolKind::Array { element, dimension }) => {
                let element = *element;
                let dimension = *dimension;
                let current = match &symbol.value {
                    Some(Value::Array(items)) => usize::try_from(*index).ok().and_then(|i| items.get(i).cloned()),
                    _ => None,
                };
                match current {
                    Some(current) => Some(Slot::Element {
                        element,
                        index: *index as usize,
                        current,
                    }),
                    None => {
                        self.report_out_of_bounds(name, *index, dimension, line);
                        None
                    }
                }
            }
            (Place::Element { .. }, _) => {
                self.diagnostics.report(
                    DiagnosticKind::NotAnArray,
                    format!("'{}' is not an array", name),
                    line,
                    Some(name),
                );
                None
            }
            (Place::Variable(_), SymbolKind::Function(_)) => {
                self.diagnostics.report(
                    DiagnosticKind::TypeMismatch,
                    format!("Cannot assign to function '{}'", name),
                    line,
                    Some(name),
                );
                None
            }
        }
    }

    /// Apply a compound operator to the prior value.
    fn combine(&mut self, op: AssignOp, current: Option<Value>, rhs: Value, name: &str, line: usize) -> Option<Value> {
        let Some(binary) = op.binary() else {
            return Some(rhs);
        };
        let Some(current) = current else {
            self.report_unset(name, line);
            return None;
        };
        self.binary_op(binary, current, rhs, line)
    }
}

//! Function calls
//!
//! Functions are registered in the global scope before the entry body runs,
//! so a call may name a function defined later in the source. A call:
//!
//! 1. evaluates the arguments in the caller's scope
//! 2. checks arity and the call-depth budget
//! 3. type-checks each argument against its parameter
//! 4. opens a function scope chained to the global scope and binds the parameters
//! 5. runs the local declarations and the body
//! 6. for `full` functions, evaluates the trailing `spit` expression
//!
//! Arity or type problems skip the body entirely.

use std::rc::Rc;

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::stack::{Symbol, SymbolKind};
use crate::memory::value::Value;
use crate::parser::ast::{Expr, FunctionDef};

impl Interpreter<'_> {
    /// Call used as a statement; any result is discarded.
    pub(crate) fn call_statement(&mut self, name: &str, args: &[Expr], line: usize) {
        if let Some(def) = self.resolve_function(name, line) {
            self.invoke(&def, args, line);
        }
    }

    /// Call inside an expression; `hungry` functions are rejected.
    pub(crate) fn call_for_value(&mut self, name: &str, args: &[Expr], line: usize) -> Option<Value> {
        let def = self.resolve_function(name, line)?;
        if def.return_type.is_none() {
            self.diagnostics.report(
                DiagnosticKind::VoidFunction,
                format!("Function '{}' does not return a value", name),
                line,
                Some(name),
            );
            return None;
        }
        self.invoke(&def, args, line)
    }

    fn resolve_function(&mut self, name: &str, line: usize) -> Option<Rc<FunctionDef>> {
        let Some(symbol) = self.scopes.lookup(name, true) else {
            self.diagnostics.report(
                DiagnosticKind::UndeclaredFunction,
                format!("Function '{}' is not declared", name),
                line,
                Some(name),
            );
            return None;
        };
        match &symbol.kind {
            SymbolKind::Function(def) => Some(Rc::clone(def)),
            _ => {
                self.diagnostics.report(
                    DiagnosticKind::NotCallable,
                    format!("'{}' is not a function", name),
                    line,
                    Some(name),
                );
                None
            }
        }
    }

    fn invoke(&mut self, def: &Rc<FunctionDef>, args: &[Expr], line: usize) -> Option<Value> {
        let name = def.name.as_str();
        let values: Vec<Option<Value>> = args.iter().map(|arg| self.evaluate(arg)).collect();

        let expected = def.params.len();
        if values.len() != expected {
            let kind = if values.len() < expected {
                DiagnosticKind::MissingArguments
            } else {
                DiagnosticKind::TooManyArguments
            };
            self.diagnostics.report(
                kind,
                format!(
                    "Function '{}' expects {} argument(s) but {} were given",
                    name,
                    expected,
                    values.len()
                ),
                line,
                Some(name),
            );
            return None;
        }

        let values: Vec<Value> = values.into_iter().collect::<Option<_>>()?;

        if self.call_depth >= self.config.max_call_depth {
            tracing::debug!(function = name, depth = self.call_depth, "call depth budget exhausted");
            self.diagnostics.report(
                DiagnosticKind::CallDepthExceeded,
                format!(
                    "Call to '{}' exceeds the maximum call depth of {}",
                    name, self.config.max_call_depth
                ),
                line,
                Some(name),
            );
            return None;
        }

        let mut bound = Vec::with_capacity(values.len());
        for (index, (param, value)) in def.params.iter().zip(values).enumerate() {
            let context = format!("argument {} of '{}'", index + 1, name);
            bound.push(self.check_assignable(param.data_type.value_type(), value, &context, line, &param.name));
        }
        let bound: Vec<Value> = bound.into_iter().collect::<Option<_>>()?;

        tracing::trace!(function = name, depth = self.call_depth + 1, "call");
        self.call_depth += 1;
        self.scopes.push_function();

        for (param, value) in def.params.iter().zip(bound) {
            let symbol = Symbol::scalar(&param.name, param.data_type.value_type(), param.line).with_value(value);
            if self.scopes.declare(symbol).is_err() {
                self.report_duplicate(&param.name, param.line);
            }
        }
        for declaration in &def.locals {
            self.execute_declaration(declaration);
        }
        for stmt in &def.body {
            self.execute_statement(stmt);
        }

        let result = match (&def.result, def.return_type) {
            (Some(expr), Some(return_type)) => self.at_site(expr, |this| {
                let value = this.evaluate(expr)?;
                let context = format!("return value of '{}'", name);
                this.check_assignable(return_type.value_type(), value, &context, expr.line(), name)
            }),
            _ => None,
        };

        self.exit_scope();
        self.call_depth -= 1;
        result
    }
}

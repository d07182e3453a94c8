//! Statement execution implementation
//!
//! This module dispatches every statement form and handles the ones that do
//! not open scopes of their own:
//!
//! - Variable and array declarations
//! - Assignment and `++` / `--`
//! - `serve` output and `make` input
//! - Calls used as statements
//!
//! Conditionals live in [`super::conditionals`], loops in [`super::loops`]
//! and calls in [`super::functions`].
//!
//! # Implementation
//!
//! All statement execution methods are implemented as `pub(crate)` methods
//! on the [`Interpreter`] struct. None of them return errors: problems are
//! recorded as diagnostics and execution moves on to the next statement.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::interpreter::type_system::parse_input;
use crate::memory::is_compatible;
use crate::memory::stack::{ScopeKind, Symbol, SymbolKind};
use crate::memory::value::Value;
use crate::parser::ast::{ArrayDecl, Declaration, Expr, Statement};

impl Interpreter<'_> {
    pub(crate) fn execute_statement(&mut self, stmt: &Statement) {
        self.at_site(stmt, |this| this.dispatch_statement(stmt));
    }

    fn dispatch_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Call { name, args, line } => self.call_statement(name, args, *line),

            Statement::Assign { target, op, value, line } => self.execute_assign(target, *op, value, *line),

            Statement::Step { name, op, line } => {
                self.execute_step(name, *op, *line);
            }

            Statement::If { branches, otherwise, .. } => self.execute_if(branches, otherwise.as_deref()),

            Statement::Switch {
                subject,
                cases,
                default,
                line,
            } => self.execute_switch(subject, cases, default.as_deref(), *line),

            Statement::For {
                declares,
                var,
                init,
                condition,
                step_var,
                step,
                body,
                line,
            } => self.execute_for(*declares, var, init, condition, step_var, *step, body, *line),

            Statement::While { condition, body, line } => self.execute_while(condition, body, *line),

            Statement::DoWhile { body, condition, line } => self.execute_do_while(body, condition, *line),

            Statement::Serve { parts, line } => self.execute_serve(parts, *line),

            Statement::Make { target, line } => self.execute_make(target, *line),
        }
    }

    /// Run `body` in a fresh scope of `kind`.
    pub(crate) fn execute_block(&mut self, body: &[Statement], kind: ScopeKind) {
        self.enter_scope(kind);
        for stmt in body {
            self.execute_statement(stmt);
        }
        self.exit_scope();
    }

    pub(crate) fn execute_declaration(&mut self, declaration: &Declaration) {
        self.at_site(declaration, |this| this.declare(declaration));
    }

    fn declare(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Variables { data_type, declarators } => {
                let target = data_type.value_type();
                for declarator in declarators {
                    let mut symbol = Symbol::scalar(&declarator.name, target, declarator.line);
                    if let Some(init) = &declarator.init {
                        let context = format!("initialization of '{}'", declarator.name);
                        symbol.value =
                            self.check_assignable(target, init.to_value(), &context, declarator.line, &declarator.name);
                    }
                    self.declare_symbol(symbol);
                }
            }
            Declaration::Array(array) => self.declare_array(array),
        }
    }

    fn declare_array(&mut self, array: &ArrayDecl) {
        let element = array.element.value_type();
        let name = array.name.as_str();

        let dimension = array
            .dimension
            .parse::<i64>()
            .ok()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| (1..=self.config.max_array_length).contains(n));
        let Some(dimension) = dimension else {
            self.diagnostics.report(
                DiagnosticKind::InvalidArraySize,
                format!("Invalid array size '{}' for '{}'", array.dimension, name),
                array.line,
                Some(name),
            );
            // Declared empty so later uses report bounds rather than cascading
            let symbol = Symbol::array(name, element, 0, array.line).with_value(Value::Array(Vec::new()));
            self.declare_symbol(symbol);
            return;
        };

        let mut items = Vec::with_capacity(dimension);
        if let Some(literals) = &array.elements {
            if literals.len() < dimension {
                self.diagnostics.report(
                    DiagnosticKind::MissingElements,
                    format!(
                        "Array '{}' expects {} elements but {} were given",
                        name,
                        dimension,
                        literals.len()
                    ),
                    array.line,
                    Some(name),
                );
            } else if literals.len() > dimension {
                self.diagnostics.report(
                    DiagnosticKind::TooManyElements,
                    format!(
                        "Array '{}' holds {} elements but {} were given",
                        name,
                        dimension,
                        literals.len()
                    ),
                    array.line,
                    Some(name),
                );
            }

            for literal in literals.iter().take(dimension) {
                let value = literal.to_value();
                if is_compatible(element, &value) {
                    items.push(value);
                } else {
                    self.diagnostics.report(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "Type mismatch in array initialization of '{}': cannot assign '{}' to '{}'",
                            name,
                            value.value_type(),
                            element
                        ),
                        array.line,
                        Some(name),
                    );
                    items.push(Value::default_for(element));
                }
            }
        }
        items.resize(dimension, Value::default_for(element));

        let symbol = Symbol::array(name, element, dimension, array.line).with_value(Value::Array(items));
        self.declare_symbol(symbol);
    }

    fn declare_symbol(&mut self, symbol: Symbol) {
        let name = symbol.name.clone();
        let line = symbol.line;
        if self.scopes.declare(symbol).is_err() {
            self.report_duplicate(&name, line);
        }
    }

    pub(crate) fn report_duplicate(&mut self, name: &str, line: usize) {
        self.diagnostics.report(
            DiagnosticKind::DuplicateDeclaration,
            format!("Duplicate declaration of '{}': the name is already used by a function", name),
            line,
            Some(name),
        );
    }

    /// `serve ( a + b + ... );` formats each part and appends the concatenation.
    fn execute_serve(&mut self, parts: &[Expr], line: usize) {
        let values: Vec<Option<Value>> = parts.iter().map(|part| self.evaluate(part)).collect();
        let Some(values) = values.into_iter().collect::<Option<Vec<_>>>() else {
            return;
        };
        let text: String = values.iter().map(|v| v.to_string()).collect();
        tracing::trace!(line, %text, "serve");
        self.output.serve(text, line);
    }

    /// `make ( id );` asks the input source and validates the answer.
    fn execute_make(&mut self, target: &str, line: usize) {
        let Some(symbol) = self.scopes.lookup(target, true) else {
            self.report_undeclared(target, line);
            return;
        };
        let value_type = match &symbol.kind {
            SymbolKind::Scalar(t) => *t,
            other => {
                let described = other.describe();
                self.diagnostics.report(
                    DiagnosticKind::InvalidValue,
                    format!("Cannot read input into '{}' of type '{}'", target, described),
                    line,
                    Some(target),
                );
                return;
            }
        };

        let Some(raw) = self.input.read(target) else {
            self.diagnostics.report(
                DiagnosticKind::InvalidValue,
                format!("Input for '{}' was cancelled", target),
                line,
                Some(target),
            );
            return;
        };

        match parse_input(value_type, &raw, &self.config.integer_range) {
            Some(value) => {
                if let Some(symbol) = self.scopes.lookup_mut(target) {
                    symbol.value = Some(value);
                }
            }
            None => {
                self.diagnostics.report(
                    DiagnosticKind::InvalidValue,
                    format!("Invalid {} value '{}' for '{}'", value_type, raw.trim(), target),
                    line,
                    Some(target),
                );
            }
        }
    }
}

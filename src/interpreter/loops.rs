//! Loop statement execution (`for`, `simmer`, `keepmix ... simmer`).
//!
//! Adds `impl Interpreter` methods for the three loop forms. Every body
//! execution gets its own loop scope. All three share the iteration budget
//! from [`crate::config::RunConfig::max_loop_iterations`]: the body runs at
//! most that many times, and a loop that still wants another pass is
//! abandoned with an `INFINITE_LOOP_RISK` diagnostic.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::DiagnosticKind;
use crate::memory::stack::{ScopeKind, Symbol, SymbolKind};
use crate::memory::value::{Value, ValueType};
use crate::parser::ast::{Expr, Statement, StepOp};

impl Interpreter<'_> {
    /// True once `iterations` has used up the budget; reports the abort.
    fn loop_budget_exhausted(&mut self, iterations: usize, keyword: &str, line: usize) -> bool {
        if iterations < self.config.max_loop_iterations {
            return false;
        }
        tracing::debug!(keyword, line, iterations, "loop aborted");
        self.diagnostics.report(
            DiagnosticKind::InfiniteLoopRisk,
            format!(
                "'{}' loop exceeded {} iterations and was stopped",
                keyword, self.config.max_loop_iterations
            ),
            line,
            None,
        );
        true
    }

    /// `for ( [pinch] var = init ; condition ; step ) { body }`
    ///
    /// The induction variable is declared (or looked up) in the enclosing
    /// scope, so it keeps its final value after the loop. Each iteration's
    /// body still gets a fresh loop scope.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn execute_for(
        &mut self,
        declares: bool,
        var: &str,
        init: &Expr,
        condition: &Expr,
        step_var: &str,
        step: StepOp,
        body: &[Statement],
        line: usize,
    ) {
        let initial = self.evaluate(init);

        let ready = if declares {
            let mut symbol = Symbol::scalar(var, ValueType::Integer, line);
            if let Some(value) = initial {
                let context = format!("initialization of '{}'", var);
                symbol.value = self.check_assignable(ValueType::Integer, value, &context, line, var);
            }
            let ok = symbol.value.is_some();
            if self.scopes.declare(symbol).is_err() {
                self.report_duplicate(var, line);
            }
            ok
        } else {
            self.assign_loop_variable(var, initial, line)
        };

        if ready {
            let mut iterations = 0;
            while self.evaluate_condition(condition) {
                if self.loop_budget_exhausted(iterations, "for", line) {
                    break;
                }
                self.execute_block(body, ScopeKind::Loop);
                iterations += 1;
                if !self.execute_step(step_var, step, line) {
                    break;
                }
            }
        }
    }

    /// Reuse an existing variable as the induction variable.
    fn assign_loop_variable(&mut self, var: &str, initial: Option<Value>, line: usize) -> bool {
        let Some(symbol) = self.scopes.lookup(var, true) else {
            self.report_undeclared(var, line);
            return false;
        };
        let SymbolKind::Scalar(target) = symbol.kind else {
            self.diagnostics.report(
                DiagnosticKind::TypeMismatch,
                format!("Loop variable '{}' must be a scalar", var),
                line,
                Some(var),
            );
            return false;
        };
        let Some(initial) = initial else {
            return false;
        };
        let context = format!("initialization of '{}'", var);
        let Some(value) = self.check_assignable(target, initial, &context, line, var) else {
            return false;
        };
        if let Some(symbol) = self.scopes.lookup_mut(var) {
            symbol.value = Some(value);
        }
        true
    }

    /// `simmer ( condition ) { body }`
    pub(crate) fn execute_while(&mut self, condition: &Expr, body: &[Statement], line: usize) {
        let mut iterations = 0;
        while self.evaluate_condition(condition) {
            if self.loop_budget_exhausted(iterations, "simmer", line) {
                break;
            }
            self.execute_block(body, ScopeKind::Loop);
            iterations += 1;
        }
    }

    /// `keepmix { body } simmer ( condition )`; the body runs at least once.
    pub(crate) fn execute_do_while(&mut self, body: &[Statement], condition: &Expr, line: usize) {
        let mut iterations = 0;
        loop {
            if self.loop_budget_exhausted(iterations, "keepmix", line) {
                break;
            }
            self.execute_block(body, ScopeKind::Loop);
            iterations += 1;
            if !self.evaluate_condition(condition) {
                break;
            }
        }
    }
}

// Execution engine for dinein programs

use std::rc::Rc;

use crate::config::RunConfig;
use crate::interpreter::errors::{DiagnosticKind, Diagnostics};
use crate::interpreter::input::InputSource;
use crate::memory::stack::{ScopeKind, ScopeStack, Symbol};
use crate::memory::value::Value;
use crate::output::OutputBuffer;
use crate::parser::ast::Program;

/// Banner appended to the output of a clean run
pub const SUCCESS_BANNER: &str = "===Program executed successfully===";

/// Result text of a run that reported errors
pub const FAILURE_BANNER: &str = "===Cannot run program with errors===";

/// Walks a lowered program, checking and executing it in one pass
pub struct Interpreter<'a> {
    /// Shared so statement lists can be walked while `self` is mutated
    program: Rc<Program>,

    /// Active scopes, global first
    pub(crate) scopes: ScopeStack,

    /// Semantic errors and warnings found so far
    pub(crate) diagnostics: Diagnostics,

    /// Strings produced by `serve`
    pub(crate) output: OutputBuffer,

    pub(crate) config: RunConfig,

    /// Answers `make` requests
    pub(crate) input: &'a mut dyn InputSource,

    /// Function calls currently in progress
    pub(crate) call_depth: usize,

    finished: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: Program, config: RunConfig, input: &'a mut dyn InputSource) -> Self {
        Interpreter {
            program: Rc::new(program),
            scopes: ScopeStack::new(),
            diagnostics: Diagnostics::new(),
            output: OutputBuffer::new(),
            config,
            input,
            call_depth: 0,
            finished: false,
        }
    }

    /// Run the program from start to finish.
    ///
    /// Globals are declared first, then every function is registered in the
    /// global scope in source order, then the entry body runs in its own
    /// scope chained to the global one. That scope is kept once the run ends
    /// so [`Interpreter::variable`] can read the final values. Running twice
    /// starts from a fresh scope stack and empty output.
    pub fn run(&mut self) {
        self.scopes = ScopeStack::new();
        self.diagnostics = Diagnostics::new();
        self.output.clear();
        self.call_depth = 0;

        let program = Rc::clone(&self.program);

        for declaration in &program.globals {
            self.execute_declaration(declaration);
        }

        for function in &program.functions {
            if self
                .scopes
                .declare_global(Symbol::function(Rc::clone(function)))
                .is_err()
            {
                self.diagnostics.report(
                    DiagnosticKind::DuplicateDeclaration,
                    format!("Duplicate declaration of function '{}'", function.name),
                    function.line,
                    Some(&function.name),
                );
            }
        }

        self.scopes.push_entry();
        for declaration in &program.locals {
            self.execute_declaration(declaration);
        }
        for stmt in &program.body {
            self.execute_statement(stmt);
        }

        self.check_termination(program.exit_code, program.exit_line);
        self.finished = true;

        tracing::info!(
            diagnostics = self.diagnostics.len(),
            output_lines = self.output.lines.len(),
            "run complete"
        );
    }

    fn check_termination(&mut self, code: i64, line: usize) {
        if self.config.accepted_exit_codes.contains(&code) {
            return;
        }
        let accepted = self
            .config
            .accepted_exit_codes
            .iter()
            .map(|c| format!("'spit {};'", c))
            .collect::<Vec<_>>()
            .join(" or ");
        self.diagnostics.report(
            DiagnosticKind::InvalidTerminationCode,
            format!("Program must terminate with {}", accepted),
            line,
            None,
        );
    }

    /// Run `f` with `node` as the current diagnostic site.
    pub(crate) fn at_site<T, R>(&mut self, node: &T, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.diagnostics.enter_site(node as *const T as usize);
        let result = f(self);
        self.diagnostics.enter_site(previous);
        result
    }

    /// Open a block scope chained to the current one.
    pub(crate) fn enter_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
    }

    /// Discard the innermost scope, warning about locals nobody read.
    pub(crate) fn exit_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        if matches!(scope.kind, ScopeKind::Global | ScopeKind::Entry) {
            return;
        }
        for symbol in scope.unused() {
            self.diagnostics.report_once(
                DiagnosticKind::UnusedVariable,
                format!("Unused local variable '{}'", symbol.name),
                symbol.line,
                Some(&symbol.name),
            );
        }
    }

    /// Final value of a global variable
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.scopes.global().get(name).and_then(|s| s.value.as_ref())
    }

    /// Final value of a variable visible from the entry body, entry locals
    /// first
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scopes.peek(name).and_then(|s| s.value.as_ref())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Output followed by the success banner, or the failure banner when
    /// any error was reported.
    pub fn result_text(&self) -> String {
        if self.diagnostics.has_errors() {
            return FAILURE_BANNER.to_string();
        }
        if self.output.is_empty() {
            return SUCCESS_BANNER.to_string();
        }
        format!("{}\n\n{}", self.output.get_output().join("\n"), SUCCESS_BANNER)
    }

    pub fn into_parts(self) -> (Diagnostics, OutputBuffer) {
        (self.diagnostics, self.output)
    }
}

//! Semantic diagnostics
//!
//! Problems found while interpreting are not Rust errors. Each one becomes a
//! [`Diagnostic`] pushed into the run's [`Diagnostics`] collector, and the
//! evaluation that hit it yields no value. The run then continues so later
//! problems are reported too.

use std::fmt;

use rustc_hash::FxHashSet;

/// Error or warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// Closed set of diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DuplicateDeclaration,
    UndeclaredIdentifier,
    UndeclaredFunction,
    /// Declared but never assigned
    UnsetValue,
    TypeMismatch,
    InvalidOperands,
    ArithmeticOverflow,
    DivisionByZero,
    /// Condition did not evaluate to a Boolean
    InvalidCondition,
    MissingElements,
    TooManyElements,
    InvalidArraySize,
    ArrayOutOfBounds,
    NotAnArray,
    NotCallable,
    MissingArguments,
    TooManyArguments,
    /// A `hungry` function used where a value is needed
    VoidFunction,
    InfiniteLoopRisk,
    CallDepthExceeded,
    /// `make` input rejected or cancelled
    InvalidValue,
    InvalidTerminationCode,
    UnusedVariable,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateDeclaration => "DUPLICATE_DECLARATION",
            DiagnosticKind::UndeclaredIdentifier => "UNDECLARED_IDENTIFIER",
            DiagnosticKind::UndeclaredFunction => "UNDECLARED_FUNCTION",
            DiagnosticKind::UnsetValue => "UNSET_VALUE",
            DiagnosticKind::TypeMismatch => "TYPE_MISMATCH",
            DiagnosticKind::InvalidOperands => "INVALID_OPERANDS",
            DiagnosticKind::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            DiagnosticKind::DivisionByZero => "DIVISION_BY_ZERO",
            DiagnosticKind::InvalidCondition => "INVALID_CONDITION",
            DiagnosticKind::MissingElements => "MISSING_ELEMENTS",
            DiagnosticKind::TooManyElements => "TOO_MANY_ELEMENTS",
            DiagnosticKind::InvalidArraySize => "INVALID_ARRAY_SIZE",
            DiagnosticKind::ArrayOutOfBounds => "ARRAY_OUT_OF_BOUNDS",
            DiagnosticKind::NotAnArray => "NOT_AN_ARRAY",
            DiagnosticKind::NotCallable => "NOT_CALLABLE",
            DiagnosticKind::MissingArguments => "MISSING_ARGUMENTS",
            DiagnosticKind::TooManyArguments => "TOO_MANY_ARGUMENTS",
            DiagnosticKind::VoidFunction => "VOID_FUNCTION",
            DiagnosticKind::InfiniteLoopRisk => "INFINITE_LOOP_RISK",
            DiagnosticKind::CallDepthExceeded => "CALL_DEPTH_EXCEEDED",
            DiagnosticKind::InvalidValue => "INVALID_VALUE",
            DiagnosticKind::InvalidTerminationCode => "INVALID_TERMINATION_CODE",
            DiagnosticKind::UnusedVariable => "UNUSED_VARIABLE",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::UnusedVariable => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One semantic finding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: Option<usize>,
    pub identifier: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line: None,
            identifier: None,
        }
    }

    pub fn at(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn on(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)?;
        if let Some(line) = self.line {
            write!(f, " on line {}", line)?;
        }
        Ok(())
    }
}

/// Per-run diagnostic collector
///
/// Diagnostics are keyed by the source construct that raised them, its
/// *site*. Re-running a site (a loop body, a function called twice) repeats
/// nothing, while two statements on one line each get their own report.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    seen: FxHashSet<(Option<usize>, Diagnostic)>,
    /// Construct currently executing; 0 outside any statement
    site: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `site` the current site and return the previous one, which the
    /// caller restores once the construct is done.
    pub fn enter_site(&mut self, site: usize) -> usize {
        std::mem::replace(&mut self.site, site)
    }

    /// Record a diagnostic for the current site. One identical to a
    /// diagnostic already raised at this site is dropped.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.record(Some(self.site), diagnostic);
    }

    fn record(&mut self, site: Option<usize>, diagnostic: Diagnostic) {
        if !self.seen.insert((site, diagnostic.clone())) {
            return;
        }
        tracing::debug!(%diagnostic, site, "diagnostic");
        self.items.push(diagnostic);
    }

    /// Report an error tied to a line and an identifier.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        identifier: Option<&str>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message).at(line);
        diagnostic.identifier = identifier.map(str::to_string);
        self.push(diagnostic);
    }

    /// Like [`Diagnostics::report`], but recorded at most once per run
    /// whatever the site. Used for findings about declarations rather than
    /// executions.
    pub fn report_once(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        line: usize,
        identifier: Option<&str>,
    ) {
        let mut diagnostic = Diagnostic::new(kind, message).at(line);
        diagnostic.identifier = identifier.map(str::to_string);
        self.record(None, diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics of one kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_line() {
        let d = Diagnostic::new(DiagnosticKind::UndeclaredIdentifier, "Undeclared identifier 'h'")
            .at(3)
            .on("h");
        assert_eq!(
            d.to_string(),
            "[UNDECLARED_IDENTIFIER] Undeclared identifier 'h' on line 3"
        );

        let d = Diagnostic::new(DiagnosticKind::InvalidTerminationCode, "bad code");
        assert_eq!(d.to_string(), "[INVALID_TERMINATION_CODE] bad code");
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticKind::UnusedVariable, "Unused local variable 'x'", 2, Some("x"));
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);

        diagnostics.report(DiagnosticKind::DivisionByZero, "Division by zero", 4, None);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.of_kind(DiagnosticKind::DivisionByZero).count(), 1);
    }

    #[test]
    fn test_identical_diagnostics_recorded_once() {
        let mut diagnostics = Diagnostics::new();
        for _ in 0..3 {
            diagnostics.report(DiagnosticKind::UndeclaredIdentifier, "Undeclared identifier 'h'", 7, Some("h"));
        }
        diagnostics.report(DiagnosticKind::UndeclaredIdentifier, "Undeclared identifier 'h'", 8, Some("h"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_same_fault_at_two_sites_recorded_twice() {
        let mut diagnostics = Diagnostics::new();
        for site in [11, 12, 11] {
            let previous = diagnostics.enter_site(site);
            diagnostics.report(DiagnosticKind::UndeclaredIdentifier, "Undeclared identifier 'h'", 3, Some("h"));
            diagnostics.enter_site(previous);
        }
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_report_once_ignores_site() {
        let mut diagnostics = Diagnostics::new();
        for site in [1, 2, 3] {
            diagnostics.enter_site(site);
            diagnostics.report_once(DiagnosticKind::UnusedVariable, "Unused local variable 'x'", 2, Some("x"));
        }
        assert_eq!(diagnostics.warnings().count(), 1);
    }
}

//! # Introduction
//!
//! dinein is the front end and execution engine for a small cooking-themed
//! teaching language. Source text is scanned, parsed by a table-driven LL(1)
//! parser, lowered to a typed tree and then checked and executed in one
//! tree-walking pass.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → LL(1) Parser → Parse tree → Lowering → Interpreter → Output
//! ```
//!
//! 1. [`parser`]: the scanner, the grammar with its FIRST / FOLLOW / PREDICT
//!    sets and parse table, the table-driven parser with panic-mode
//!    recovery, the parse tree and its lowering to [`parser::ast`].
//! 2. [`interpreter`]: walks the lowered program against a scope stack,
//!    recording semantic diagnostics instead of stopping at the first one.
//! 3. [`memory`]: tagged [`memory::value::Value`]s and the
//!    [`memory::stack::ScopeStack`] that holds them.
//! 4. [`output`]: the per-run buffer `serve` writes to.
//! 5. [`config`]: per-run limits.
//!
//! Each phase gates the next: a program with lexical errors is not parsed,
//! and a program with syntax errors is not interpreted.
//!
//! ```
//! use dinein::{analyze, config::RunConfig, interpreter::ScriptedInput};
//!
//! let source = "dinein chef pinch dish() { serve(\"hi\"); spit 0; } takeout";
//! let analysis = analyze(source, &RunConfig::default(), &mut ScriptedInput::empty()).unwrap();
//! assert_eq!(analysis.output, vec!["hi"]);
//! ```

pub mod config;
pub mod interpreter;
pub mod memory;
pub mod output;
pub mod parser;

use std::path::PathBuf;
use std::thread;

use thiserror::Error;

use config::RunConfig;
use interpreter::engine::FAILURE_BANNER;
use interpreter::{Diagnostic, InputSource, Interpreter};
use parser::grammar::language_tables;
use parser::lexer::{LexError, Lexer, Token};
use parser::lower::{lower_program, LowerError};
use parser::parser::SyntaxError;
use parser::table::GrammarConflict;
use parser::tree::ParseTreeNode;

/// Failures that abort a whole run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarConflict),

    #[error(transparent)]
    Lower(#[from] LowerError),

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start the interpreter thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Last phase to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Stage {
    Lex,
    Syntax,
    Run,
}

/// Everything one pass over a source text produced
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub lex_errors: Vec<LexError>,
    pub syntax_errors: Vec<SyntaxError>,
    /// Present when parsing succeeded
    pub tree: Option<ParseTreeNode>,
    pub diagnostics: Vec<Diagnostic>,
    pub output: Vec<String>,
    /// Output plus banner, or the failure banner
    pub result: String,
}

impl Analysis {
    /// True when any phase reported an error. Warnings do not count.
    pub fn has_errors(&self) -> bool {
        !self.lex_errors.is_empty()
            || !self.syntax_errors.is_empty()
            || self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

/// Run the full pipeline over `source`.
pub fn analyze(source: &str, config: &RunConfig, input: &mut dyn InputSource) -> Result<Analysis, Error> {
    analyze_until(source, Stage::Run, config, input)
}

/// Run the pipeline up to and including `stage`.
pub fn analyze_until(
    source: &str,
    stage: Stage,
    config: &RunConfig,
    input: &mut dyn InputSource,
) -> Result<Analysis, Error> {
    let lexed = Lexer::new(source).tokenize();
    tracing::debug!(tokens = lexed.tokens.len(), errors = lexed.errors.len(), "scanned");

    let mut analysis = Analysis {
        tokens: lexed.tokens,
        lex_errors: lexed.errors,
        result: FAILURE_BANNER.to_string(),
        ..Analysis::default()
    };
    if stage == Stage::Lex || !analysis.lex_errors.is_empty() {
        return Ok(analysis);
    }

    let tables = language_tables()?;
    let outcome = parser::parser::parse(tables, config, &analysis.tokens);
    analysis.syntax_errors = outcome.errors;
    analysis.tree = outcome.tree;
    if stage == Stage::Syntax || !outcome.success {
        return Ok(analysis);
    }
    let Some(tree) = analysis.tree.as_ref() else {
        return Ok(analysis);
    };

    let (result, diagnostics, output) = execute(tree, config, input)?;
    analysis.result = result;
    analysis.diagnostics = diagnostics;
    analysis.output = output;
    Ok(analysis)
}

/// Lower and interpret `tree` on a dedicated thread whose stack is sized
/// for `config.max_call_depth` nested calls.
fn execute(
    tree: &ParseTreeNode,
    config: &RunConfig,
    input: &mut dyn InputSource,
) -> Result<(String, Vec<Diagnostic>, Vec<String>), Error> {
    let stack_size = config.stack_size();
    tracing::debug!(stack_size, "starting interpreter thread");

    thread::scope(|scope| -> Result<_, Error> {
        let handle = thread::Builder::new()
            .name("dinein-run".to_string())
            .stack_size(stack_size)
            .spawn_scoped(scope, move || -> Result<_, Error> {
                let program = lower_program(tree)?;
                let mut interpreter = Interpreter::new(program, config.clone(), input);
                interpreter.run();

                let result = interpreter.result_text();
                let (diagnostics, output) = interpreter.into_parts();
                Ok((result, diagnostics.into_vec(), output.get_output()))
            })
            .map_err(Error::Thread)?;

        handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
}

//! Tree-walking interpreter for lowered dinein programs
//!
//! This module checks and executes a [`crate::parser::ast::Program`] in a
//! single pass:
//! - [`engine`]: the [`Interpreter`] and the run driver
//! - [`errors`]: semantic diagnostics and their collector
//! - [`input`]: the port `make` reads from
//!
//! # Execution Model
//!
//! The interpreter walks statements in order against a stack of scopes.
//! Semantic problems never stop the run: each one is recorded as a
//! diagnostic, the faulty statement or expression is abandoned, and
//! execution continues so that later problems are found too. A run that
//! recorded any error produces no result text beyond the failure banner.
//!
//! Loops and calls are bounded by [`crate::config::RunConfig`], so every run
//! terminates.

pub mod conditionals;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod functions;
pub mod input;
pub mod loops;
pub mod ops;
pub mod statements;
pub mod type_system;

pub use engine::Interpreter;
pub use errors::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use input::{InputSource, ScriptedInput};

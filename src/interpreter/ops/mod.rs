//! Operator semantics, as `impl Interpreter` blocks
//!
//! - [`binary`]: arithmetic, comparison and logical operators
//! - [`unary`]: `!`, `!!` and the `++` / `--` statements
//! - [`assign`]: plain and compound assignment, including element stores

pub mod assign;
pub mod binary;
pub mod unary;

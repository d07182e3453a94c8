//! dinein front end
//!
//! This module turns source text into a typed program:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`grammar`]: The LL(1) grammar and the process-wide [`grammar::LanguageTables`]
//! - [`sets`]: FIRST / FOLLOW / PREDICT computation over any grammar
//! - [`table`]: Parse table construction with conflict detection
//! - [`parser`]: Table-driven parsing with panic-mode recovery (tokens → parse tree)
//! - [`tree`]: Parse tree nodes and their pretty-printer
//! - [`lower`]: Parse tree → [`ast`] lowering
//! - [`ast`]: Typed program definitions
//!
//! # Parser Implementation
//!
//! No parser generator: the grammar is a static table, its sets and parse
//! table are derived once at first use, and a stack machine drives parsing
//! from the table. The grammar encodes no operator precedence; lowering
//! folds the flat operator chains into precedence-respecting trees.

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod sets;
pub mod table;
pub mod tree;

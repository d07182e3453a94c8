//! Table-driven LL(1) parser with panic-mode recovery
//!
//! The parser keeps an explicit stack of pending grammar symbols (seeded with
//! `$` and the start symbol) and a stack of open tree nodes that mirrors it.
//! Each expansion pushes an end-of-production marker below the production's
//! symbols; popping that marker closes the node it opened.
//!
//! On a missing table entry or a mismatched terminal the parser reports one
//! [`SyntaxError`] and first tries a single-token repair: deleting the
//! current token, inserting a token the stack expects, or replacing one with
//! the other. Candidates are ranked by how far a dry run of the automaton
//! gets with them, and one is only taken if that run matches a few real
//! tokens or accepts the input.
//!
//! Without an acceptable repair the parser falls back to panic mode and looks
//! for a synchronization point: the nearest stack entry that can continue
//! from the current token, either directly or via its FOLLOW set. If none
//! exists, tokens are discarded (up to [`RunConfig::max_recovery_attempts`])
//! before the parse is declared unrecoverable.

use thiserror::Error;

use crate::config::RunConfig;
use crate::parser::grammar::{GrammarSymbol, LangSymbol, LanguageTables, NonTerminal};
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::sets::Lookahead;
use crate::parser::tree::ParseTreeNode;

/// Syntax diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("[SYNTAX_ERROR] at line {line}: Expected {expected}, but found '{found}' while parsing {context}")]
    Expected {
        line: usize,
        expected: String,
        found: String,
        context: NonTerminal,
    },

    #[error("[SYNTAX_ERROR] at line {line}: Unexpected '{found}' while parsing {context}")]
    Unexpected {
        line: usize,
        found: String,
        context: NonTerminal,
    },

    #[error("[FATAL_ERROR] at line {line}: Unable to recover from syntax error")]
    Unrecoverable { line: usize },

    #[error("Incomplete parsing")]
    Incomplete { line: usize },
}

impl SyntaxError {
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Expected { line, .. }
            | SyntaxError::Unexpected { line, .. }
            | SyntaxError::Unrecoverable { line }
            | SyntaxError::Incomplete { line } => *line,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SyntaxError::Unrecoverable { .. })
    }
}

/// Result of one parse
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub success: bool,
    pub errors: Vec<SyntaxError>,
    /// Present only on success
    pub tree: Option<ParseTreeNode>,
}

/// Real tokens a repair must let the parser match before it is accepted
const REPAIR_MIN_MATCH: usize = 3;

/// Tokens a dry run looks ahead when ranking repairs
const REPAIR_SCAN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackItem {
    Symbol(LangSymbol),
    EndOfProduction,
    /// `$`
    Bottom,
}

/// Single-token fix applied before the current token
#[derive(Debug, Clone, Copy)]
struct Repair {
    /// Restart from the stack as it was after the last match
    from_checkpoint: bool,
    /// Drop the current token
    skip: bool,
    /// Token to match before the remaining input
    insert: Option<TokenKind>,
}

/// Table-driven parser for one token stream
pub struct Parser<'a> {
    tables: &'a LanguageTables,
    config: &'a RunConfig,
    tokens: &'a [Token],
    position: usize,
    stack: Vec<StackItem>,
    /// Symbol stack right after the last terminal match
    checkpoint: Vec<StackItem>,
    /// Token supplied by a repair, matched before `tokens[position]`
    inserted: Option<TokenKind>,
    open_nodes: Vec<ParseTreeNode>,
    root: Option<ParseTreeNode>,
    errors: Vec<SyntaxError>,
}

impl<'a> Parser<'a> {
    pub fn new(tables: &'a LanguageTables, config: &'a RunConfig, tokens: &'a [Token]) -> Self {
        let start = tables.grammar.start();
        let stack = vec![
            StackItem::Bottom,
            StackItem::Symbol(GrammarSymbol::NonTerminal(start)),
        ];
        Parser {
            tables,
            config,
            tokens,
            position: 0,
            checkpoint: stack.clone(),
            stack,
            inserted: None,
            open_nodes: Vec::new(),
            root: None,
            errors: Vec::new(),
        }
    }

    /// Run the parser to completion.
    pub fn parse(mut self) -> ParseOutcome {
        let completed = self.run();

        if completed && self.position != self.tokens.len() {
            let line = self.current_line();
            self.errors.push(SyntaxError::Incomplete { line });
        }

        while let Some(node) = self.open_nodes.pop() {
            self.attach(node);
        }

        let success = completed && self.errors.is_empty();
        tracing::debug!(
            success,
            errors = self.errors.len(),
            consumed = self.position,
            "parse finished"
        );

        ParseOutcome {
            success,
            errors: self.errors,
            tree: if success { self.root } else { None },
        }
    }

    /// Main loop. Returns false when parsing was abandoned.
    fn run(&mut self) -> bool {
        while let Some(&top) = self.stack.last() {
            match top {
                StackItem::Bottom => return true,

                StackItem::EndOfProduction => {
                    self.stack.pop();
                    self.close_node();
                }

                StackItem::Symbol(GrammarSymbol::Terminal(kind)) => {
                    if self.lookahead() == Lookahead::Token(kind) {
                        self.stack.pop();
                        self.match_terminal(kind);
                        self.checkpoint.clone_from(&self.stack);
                    } else if !self.syntax_error() {
                        return false;
                    }
                }

                StackItem::Symbol(GrammarSymbol::NonTerminal(nt)) => {
                    match self.tables.table.get(nt, self.lookahead()) {
                        Some(alternative) => {
                            self.stack.pop();
                            self.expand(nt, alternative);
                        }
                        None => {
                            if !self.syntax_error() {
                                return false;
                            }
                        }
                    }
                }
            }
        }
        true
    }

    fn match_terminal(&mut self, kind: TokenKind) {
        if self.inserted.take().is_some() {
            let line = self.current_line();
            tracing::trace!(terminal = %kind, line, "match inserted");
            self.attach(ParseTreeNode::leaf(kind, kind.as_str(), line));
            return;
        }

        let (lexeme, line) = match self.tokens.get(self.position) {
            Some(token) => (token.lexeme.clone(), token.line),
            None => (String::new(), self.current_line()),
        };
        tracing::trace!(terminal = %kind, %lexeme, line, "match");
        self.attach(ParseTreeNode::leaf(kind, lexeme, line));
        self.position += 1;
    }

    fn production(&self, nt: NonTerminal, alternative: usize) -> &'a [LangSymbol] {
        self.tables
            .grammar
            .alternatives(nt)
            .get(alternative)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn expand(&mut self, nt: NonTerminal, alternative: usize) {
        let line = self.current_line();
        let production = self.production(nt, alternative);

        tracing::trace!(nonterminal = %nt, alternative, line, "expand");

        let mut node = ParseTreeNode::interior(nt, line);
        if production.is_empty() {
            node.children.push(ParseTreeNode::empty(line));
            self.attach(node);
            return;
        }

        self.stack.push(StackItem::EndOfProduction);
        self.stack
            .extend(production.iter().rev().map(|symbol| StackItem::Symbol(*symbol)));
        self.open_nodes.push(node);
    }

    fn attach(&mut self, node: ParseTreeNode) {
        match self.open_nodes.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
    }

    fn close_node(&mut self) {
        if let Some(node) = self.open_nodes.pop() {
            self.attach(node);
        }
    }

    /// Report the error at the current position and try to recover.
    /// Returns false when parsing must stop.
    fn syntax_error(&mut self) -> bool {
        let line = self.current_line();
        self.report(line);

        if self.errors.len() >= self.config.max_syntax_errors {
            tracing::debug!(line, "syntax error limit reached");
            self.errors.push(SyntaxError::Unrecoverable { line });
            return false;
        }

        if self.repair() || self.recover() {
            true
        } else {
            self.errors.push(SyntaxError::Unrecoverable { line });
            false
        }
    }

    fn report(&mut self, line: usize) {
        let found = self.current_lexeme();

        let (mut expected, context): (Vec<String>, NonTerminal) = match self.stack.last() {
            Some(StackItem::Symbol(GrammarSymbol::NonTerminal(nt))) => (
                self.tables
                    .table
                    .row(*nt)
                    .map(|row| row.keys().map(ToString::to_string).collect())
                    .unwrap_or_default(),
                *nt,
            ),
            Some(StackItem::Symbol(GrammarSymbol::Terminal(kind))) => {
                (vec![kind.to_string()], self.enclosing_nonterminal())
            }
            _ => (Vec::new(), self.enclosing_nonterminal()),
        };
        expected.sort();
        expected.dedup();

        let error = if (1..=3).contains(&expected.len()) {
            let expected = expected
                .iter()
                .map(|e| format!("'{}'", e))
                .collect::<Vec<_>>()
                .join(" or ");
            SyntaxError::Expected {
                line,
                expected,
                found,
                context,
            }
        } else {
            SyntaxError::Unexpected {
                line,
                found,
                context,
            }
        };

        tracing::debug!(%error, "syntax error");
        self.errors.push(error);
    }

    /// Apply the best single-token repair, if one is good enough.
    ///
    /// Candidates are tried against the current stack and, when it differs,
    /// against the checkpoint taken after the last match. The checkpoint
    /// still holds nullable symbols that were expanded to λ on the bad token.
    fn repair(&mut self) -> bool {
        let mut best: Option<(usize, Repair)> = None;

        for from_checkpoint in [false, true] {
            let stack = if from_checkpoint {
                if self.checkpoint == self.stack {
                    break;
                }
                &self.checkpoint
            } else {
                &self.stack
            };

            for repair in self.candidates(stack, from_checkpoint) {
                let start = self.position + usize::from(repair.skip);
                let score = self.dry_run(stack, repair.insert, start);
                if score < REPAIR_MIN_MATCH {
                    continue;
                }
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, repair));
                }
            }
        }

        let Some((score, repair)) = best else {
            return false;
        };
        tracing::debug!(?repair, score, token = %self.lookahead(), "repaired");

        // The tree is dropped after any syntax error, so open nodes are left
        // as they are when the checkpoint is restored.
        if repair.from_checkpoint {
            self.stack.clone_from(&self.checkpoint);
        }
        if repair.skip {
            self.position += 1;
        }
        self.inserted = repair.insert;
        true
    }

    /// Deletion first, then insertions, then replacements.
    fn candidates(&self, stack: &[StackItem], from_checkpoint: bool) -> Vec<Repair> {
        let has_token = self.position < self.tokens.len();
        let expected = self.expected_terminals(stack);

        let mut candidates = Vec::with_capacity(2 * expected.len() + 1);
        if has_token {
            candidates.push(Repair {
                from_checkpoint,
                skip: true,
                insert: None,
            });
        }
        for skip in [false, true] {
            if skip && !has_token {
                break;
            }
            candidates.extend(expected.iter().map(|&kind| Repair {
                from_checkpoint,
                skip,
                insert: Some(kind),
            }));
        }
        candidates
    }

    /// Terminals the top of `stack` can consume next.
    fn expected_terminals(&self, stack: &[StackItem]) -> Vec<TokenKind> {
        match stack.last() {
            Some(StackItem::Symbol(GrammarSymbol::Terminal(kind))) => vec![*kind],
            Some(StackItem::Symbol(GrammarSymbol::NonTerminal(nt))) => self
                .tables
                .table
                .row(*nt)
                .map(|row| {
                    row.keys()
                        .filter_map(|lookahead| match lookahead {
                            Lookahead::Token(kind) => Some(*kind),
                            Lookahead::End => None,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Run the automaton on a copy of `stack` without building a tree,
    /// matching `insert` (if any) and then the tokens from `position`.
    ///
    /// Returns the number of real tokens matched, capped at
    /// [`REPAIR_SCAN`], or `usize::MAX` when the input is accepted.
    fn dry_run(&self, stack: &[StackItem], mut insert: Option<TokenKind>, mut position: usize) -> usize {
        let mut stack = stack.to_vec();
        let mut matched = 0;

        while matched < REPAIR_SCAN {
            let lookahead = match insert {
                Some(kind) => Lookahead::Token(kind),
                None => self
                    .tokens
                    .get(position)
                    .map_or(Lookahead::End, |token| Lookahead::Token(token.kind)),
            };

            match stack.last().copied() {
                None => return matched,
                Some(StackItem::Bottom) => {
                    return if lookahead == Lookahead::End {
                        usize::MAX
                    } else {
                        matched
                    };
                }
                Some(StackItem::EndOfProduction) => {
                    stack.pop();
                }
                Some(StackItem::Symbol(GrammarSymbol::Terminal(kind))) => {
                    if lookahead != Lookahead::Token(kind) {
                        return matched;
                    }
                    stack.pop();
                    if insert.take().is_none() {
                        position += 1;
                        matched += 1;
                    }
                }
                Some(StackItem::Symbol(GrammarSymbol::NonTerminal(nt))) => {
                    let Some(alternative) = self.tables.table.get(nt, lookahead) else {
                        return matched;
                    };
                    stack.pop();
                    stack.extend(
                        self.production(nt, alternative)
                            .iter()
                            .rev()
                            .map(|symbol| StackItem::Symbol(*symbol)),
                    );
                }
            }
        }
        matched
    }

    /// Discard tokens until some stack entry can continue.
    fn recover(&mut self) -> bool {
        let mut skipped = 0;
        loop {
            if let Some(keep) = self.find_sync_point() {
                tracing::debug!(
                    skipped,
                    popped = self.stack.len() - keep,
                    token = %self.lookahead(),
                    "recovered"
                );
                self.unwind(keep);
                self.checkpoint.clone_from(&self.stack);
                return true;
            }

            if self.position >= self.tokens.len() || skipped >= self.config.max_recovery_attempts {
                return false;
            }
            self.position += 1;
            skipped += 1;
        }
    }

    /// Length the symbol stack should be cut to, if a sync point exists.
    fn find_sync_point(&self) -> Option<usize> {
        let lookahead = self.lookahead();

        for (i, item) in self.stack.iter().enumerate().rev() {
            match *item {
                StackItem::Symbol(GrammarSymbol::Terminal(kind)) => {
                    if lookahead == Lookahead::Token(kind) {
                        return Some(i + 1);
                    }
                }
                StackItem::Symbol(GrammarSymbol::NonTerminal(nt)) => {
                    if self.tables.table.get(nt, lookahead).is_some() {
                        return Some(i + 1);
                    }
                    if self
                        .tables
                        .follow
                        .get(&nt)
                        .is_some_and(|follow| follow.contains(&lookahead))
                    {
                        return Some(i);
                    }
                }
                StackItem::Bottom => {
                    if lookahead == Lookahead::End {
                        return Some(i + 1);
                    }
                }
                StackItem::EndOfProduction => {}
            }
        }
        None
    }

    fn unwind(&mut self, keep: usize) {
        while self.stack.len() > keep {
            if let Some(StackItem::EndOfProduction) = self.stack.pop() {
                self.close_node();
            }
        }
    }

    fn enclosing_nonterminal(&self) -> NonTerminal {
        self.open_nodes
            .last()
            .and_then(ParseTreeNode::nonterminal)
            .unwrap_or_else(|| self.tables.grammar.start())
    }

    fn lookahead(&self) -> Lookahead<TokenKind> {
        if let Some(kind) = self.inserted {
            return Lookahead::Token(kind);
        }
        match self.tokens.get(self.position) {
            Some(token) => Lookahead::Token(token.kind),
            None => Lookahead::End,
        }
    }

    fn current_lexeme(&self) -> String {
        if let Some(kind) = self.inserted {
            return kind.as_str().to_string();
        }
        match self.tokens.get(self.position) {
            Some(token) => token.lexeme.clone(),
            None => String::from("$"),
        }
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }
}

/// Parse a token stream against the given tables.
pub fn parse(tables: &LanguageTables, config: &RunConfig, tokens: &[Token]) -> ParseOutcome {
    Parser::new(tables, config, tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::language_tables;
    use crate::parser::lexer::Lexer;

    fn parse_source(source: &str) -> ParseOutcome {
        let tables = language_tables().unwrap();
        let lexed = Lexer::new(source).tokenize();
        assert!(lexed.errors.is_empty(), "{:?}", lexed.errors);
        parse(tables, &RunConfig::default(), &lexed.tokens)
    }

    #[test]
    fn test_minimal_program() {
        let outcome = parse_source("dinein chef pinch dish() { spit 0; } takeout");
        assert!(outcome.success, "{:?}", outcome.errors);
        let tree = outcome.tree.unwrap();
        assert_eq!(tree.nonterminal(), Some(NonTerminal::Program));
        assert_eq!(tree.leaves().len(), 12);
    }

    #[test]
    fn test_missing_terminal_message() {
        let outcome = parse_source("dinein chef pinch dish() { spit 0 } takeout");
        assert!(!outcome.success);
        assert_eq!(
            outcome.errors[0].to_string(),
            "[SYNTAX_ERROR] at line 1: Expected ';', but found '}' while parsing <program>"
        );
        assert!(outcome.tree.is_none());
    }

    #[test]
    fn test_trailing_tokens_are_incomplete() {
        let outcome = parse_source("dinein chef pinch dish() { spit 0; } takeout pinch");
        assert!(!outcome.success);
        assert!(outcome
            .errors
            .iter()
            .any(|e| matches!(e, SyntaxError::Incomplete { .. })));
    }

    #[test]
    fn test_dry_run_scores() {
        let tables = language_tables().unwrap();
        let config = RunConfig::default();
        let lexed = Lexer::new("dinein chef pinch dish() { spit 0; } takeout").tokenize();
        let parser = Parser::new(tables, &config, &lexed.tokens);

        assert_eq!(parser.dry_run(&parser.stack, None, 0), usize::MAX);
        assert_eq!(parser.dry_run(&parser.stack, None, 1), 0);
        assert_eq!(parser.dry_run(&parser.stack, Some(TokenKind::Dinein), 1), usize::MAX);
    }

    #[test]
    fn test_missing_opener_is_repaired() {
        let outcome = parse_source("chef pinch dish() { spit 0; } takeout");
        assert_eq!(outcome.errors.len(), 1, "{:?}", outcome.errors);
        assert_eq!(
            outcome.errors[0].to_string(),
            "[SYNTAX_ERROR] at line 1: Expected 'dinein', but found 'chef' while parsing <program>"
        );
    }

    #[test]
    fn test_empty_input_is_fatal_or_reported() {
        let outcome = parse_source("");
        assert!(!outcome.success);
        assert!(!outcome.errors.is_empty());
    }
}

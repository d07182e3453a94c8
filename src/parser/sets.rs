//! FIRST / FOLLOW / PREDICT computation
//!
//! All three are pure functions of a [`Grammar`]. Sets are stored as
//! [`BTreeSet`]s and maps keep grammar declaration order, so recomputing from
//! the same grammar always yields identical results.
//!
//! - [`first_sets`]: memoized recursive descent over productions. A
//!   non-terminal already under computation yields its partial result instead
//!   of recursing, and the whole pass repeats until nothing changes.
//! - [`follow_sets`]: classic iterate-to-fixpoint over every occurrence of a
//!   non-terminal on a right-hand side.
//! - [`predict_sets`]: FIRST of the production, plus FOLLOW of its head when
//!   the production can vanish.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use super::grammar::{Atom, Grammar, GrammarSymbol, Production};

/// A lookahead: either a real terminal or the end-of-input marker `$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lookahead<T> {
    Token(T),
    End,
}

impl<T: fmt::Display> fmt::Display for Lookahead<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookahead::Token(t) => write!(f, "{}", t),
            Lookahead::End => f.write_str("$"),
        }
    }
}

/// FIRST set of a non-terminal or of a symbol sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSet<T> {
    pub terminals: BTreeSet<T>,
    /// True when λ is derivable.
    pub nullable: bool,
}

impl<T> Default for FirstSet<T> {
    fn default() -> Self {
        FirstSet {
            terminals: BTreeSet::new(),
            nullable: false,
        }
    }
}

pub type FirstSets<N, T> = IndexMap<N, FirstSet<T>>;

pub type FollowSets<N, T> = IndexMap<N, BTreeSet<Lookahead<T>>>;

/// Lookaheads selecting one alternative of a non-terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction<N, T> {
    pub head: N,
    /// Index into the head's alternatives
    pub alternative: usize,
    pub production: Production<N, T>,
    pub lookaheads: BTreeSet<Lookahead<T>>,
}

/// One entry per production, in grammar order
pub type PredictSets<N, T> = Vec<Prediction<N, T>>;

/// Compute FIRST for every non-terminal of the grammar.
pub fn first_sets<N: Atom, T: Atom>(grammar: &Grammar<N, T>) -> FirstSets<N, T> {
    let mut builder = FirstBuilder {
        grammar,
        sets: grammar
            .nonterminals()
            .map(|nt| (nt, FirstSet::default()))
            .collect(),
        in_progress: FxHashSet::default(),
        finished: FxHashSet::default(),
        changed: false,
    };

    let mut passes = 0;
    loop {
        passes += 1;
        builder.changed = false;
        builder.in_progress.clear();
        builder.finished.clear();

        for nt in grammar.nonterminals() {
            builder.first_of(nt);
        }

        if !builder.changed {
            break;
        }
    }

    tracing::trace!(passes, "FIRST sets converged");
    builder.sets
}

struct FirstBuilder<'g, N, T> {
    grammar: &'g Grammar<N, T>,
    sets: FirstSets<N, T>,
    in_progress: FxHashSet<N>,
    finished: FxHashSet<N>,
    changed: bool,
}

impl<N: Atom, T: Atom> FirstBuilder<'_, N, T> {
    fn first_of(&mut self, nt: N) -> FirstSet<T> {
        if self.finished.contains(&nt) || self.in_progress.contains(&nt) {
            return self.sets.get(&nt).cloned().unwrap_or_default();
        }
        self.in_progress.insert(nt);

        let mut result = FirstSet::default();
        for production in self.grammar.alternatives(nt) {
            let mut vanishes = true;
            for symbol in production {
                match *symbol {
                    GrammarSymbol::Terminal(t) => {
                        result.terminals.insert(t);
                        vanishes = false;
                    }
                    GrammarSymbol::NonTerminal(sub) => {
                        let sub_first = self.first_of(sub);
                        result.terminals.extend(sub_first.terminals);
                        vanishes = sub_first.nullable;
                    }
                }
                if !vanishes {
                    break;
                }
            }
            if vanishes {
                result.nullable = true;
            }
        }

        let entry = self.sets.entry(nt).or_default();
        let before = (entry.terminals.len(), entry.nullable);
        entry.terminals.extend(result.terminals);
        entry.nullable |= result.nullable;
        if before != (entry.terminals.len(), entry.nullable) {
            self.changed = true;
        }
        let merged = entry.clone();

        self.in_progress.remove(&nt);
        self.finished.insert(nt);
        merged
    }
}

/// FIRST of a symbol sequence, given FIRST of every non-terminal.
///
/// The empty sequence is nullable with no terminals.
pub fn first_of_sequence<N: Atom, T: Atom>(
    symbols: &[GrammarSymbol<N, T>],
    first: &FirstSets<N, T>,
) -> FirstSet<T> {
    let mut result = FirstSet::default();
    for symbol in symbols {
        match symbol {
            GrammarSymbol::Terminal(t) => {
                result.terminals.insert(*t);
                return result;
            }
            GrammarSymbol::NonTerminal(nt) => {
                let Some(sub) = first.get(nt) else {
                    return result;
                };
                result.terminals.extend(sub.terminals.iter().copied());
                if !sub.nullable {
                    return result;
                }
            }
        }
    }
    result.nullable = true;
    result
}

/// Compute FOLLOW for every non-terminal. The start symbol is seeded with `$`.
pub fn follow_sets<N: Atom, T: Atom>(
    grammar: &Grammar<N, T>,
    start: N,
    first: &FirstSets<N, T>,
) -> FollowSets<N, T> {
    let mut follow: FollowSets<N, T> = grammar
        .nonterminals()
        .map(|nt| (nt, BTreeSet::new()))
        .collect();
    follow.entry(start).or_default().insert(Lookahead::End);

    let mut changed = true;
    while changed {
        changed = false;

        for (head, _, production) in grammar.productions() {
            for (i, symbol) in production.iter().enumerate() {
                let GrammarSymbol::NonTerminal(nt) = *symbol else {
                    continue;
                };

                let rest = first_of_sequence(&production[i + 1..], first);
                let mut additions: BTreeSet<Lookahead<T>> =
                    rest.terminals.into_iter().map(Lookahead::Token).collect();
                if rest.nullable {
                    if let Some(head_follow) = follow.get(&head) {
                        additions.extend(head_follow.iter().copied());
                    }
                }

                let target = follow.entry(nt).or_default();
                let before = target.len();
                target.extend(additions);
                if target.len() != before {
                    changed = true;
                }
            }
        }
    }

    follow
}

/// Compute the PREDICT set of every production.
pub fn predict_sets<N: Atom, T: Atom>(
    grammar: &Grammar<N, T>,
    first: &FirstSets<N, T>,
    follow: &FollowSets<N, T>,
) -> PredictSets<N, T> {
    grammar
        .productions()
        .map(|(head, alternative, production)| {
            let first_alpha = first_of_sequence(production, first);
            let mut lookaheads: BTreeSet<Lookahead<T>> = first_alpha
                .terminals
                .into_iter()
                .map(Lookahead::Token)
                .collect();
            if first_alpha.nullable {
                if let Some(head_follow) = follow.get(&head) {
                    lookaheads.extend(head_follow.iter().copied());
                }
            }
            Prediction {
                head,
                alternative,
                production: production.clone(),
                lookaheads,
            }
        })
        .collect()
}

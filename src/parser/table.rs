//! LL(1) parse table
//!
//! [`build_table`] turns PREDICT sets into a `(non-terminal, lookahead) →
//! alternative` table. Two alternatives of one non-terminal claiming the same
//! lookahead means the grammar is not LL(1); construction stops at the first
//! such cell with a [`GrammarConflict`].

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::grammar::{render_production, Atom};
use super::sets::{Lookahead, PredictSets};

/// Two productions competing for one table cell
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("grammar is not LL(1): {nonterminal} on '{terminal}' selects both `{first}` and `{second}`")]
pub struct GrammarConflict {
    pub nonterminal: String,
    pub terminal: String,
    pub first: String,
    pub second: String,
}

/// Table row: lookahead → alternative index
pub type TableRow<T> = BTreeMap<Lookahead<T>, usize>;

/// LL(1) parse table
#[derive(Debug, Clone)]
pub struct ParseTable<N, T> {
    rows: FxHashMap<N, TableRow<T>>,
}

impl<N: Atom, T: Atom> ParseTable<N, T> {
    /// Alternative selected for `head` on `lookahead`, if any.
    pub fn get(&self, head: N, lookahead: Lookahead<T>) -> Option<usize> {
        self.rows.get(&head)?.get(&lookahead).copied()
    }

    pub fn row(&self, head: N) -> Option<&TableRow<T>> {
        self.rows.get(&head)
    }

    /// Number of filled cells
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the parse table, failing on the first conflicting cell.
pub fn build_table<N: Atom, T: Atom>(
    predict: &PredictSets<N, T>,
) -> Result<ParseTable<N, T>, GrammarConflict> {
    let mut rows: FxHashMap<N, TableRow<T>> = FxHashMap::default();

    for prediction in predict {
        let row = rows.entry(prediction.head).or_default();

        for lookahead in &prediction.lookaheads {
            if let Some(&existing) = row.get(lookahead) {
                let rival = predict
                    .iter()
                    .find(|p| p.head == prediction.head && p.alternative == existing)
                    .map(|p| render_production(&p.production))
                    .unwrap_or_default();

                return Err(GrammarConflict {
                    nonterminal: prediction.head.to_string(),
                    terminal: lookahead.to_string(),
                    first: rival,
                    second: render_production(&prediction.production),
                });
            }
            row.insert(*lookahead, prediction.alternative);
        }
    }

    Ok(ParseTable { rows })
}

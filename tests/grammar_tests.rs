// Grammar analysis tests: FIRST / FOLLOW / PREDICT and table construction

use std::collections::BTreeSet;

use dinein::parser::grammar::GrammarSymbol::{NonTerminal as Nt, Terminal as Tm};
use dinein::parser::grammar::{dinein_grammar, language_tables, Grammar, NonTerminal};
use dinein::parser::lexer::TokenKind;
use dinein::parser::sets::{first_sets, follow_sets, predict_sets, Lookahead};
use dinein::parser::table::build_table;

/// S → A b | c ; A → a A | λ
fn nullable_prefix_grammar() -> Grammar<&'static str, &'static str> {
    Grammar::new("S")
        .rule("S", vec![vec![Nt("A"), Tm("b")], vec![Tm("c")]])
        .rule("A", vec![vec![Tm("a"), Nt("A")], vec![]])
}

#[test]
fn test_sets_are_deterministic() {
    let grammar = dinein_grammar();

    let first_a = first_sets(&grammar);
    let first_b = first_sets(&grammar);
    assert_eq!(first_a, first_b);

    let follow_a = follow_sets(&grammar, grammar.start(), &first_a);
    let follow_b = follow_sets(&grammar, grammar.start(), &first_b);
    assert_eq!(follow_a, follow_b);

    let predict_a = predict_sets(&grammar, &first_a, &follow_a);
    let predict_b = predict_sets(&grammar, &first_b, &follow_b);
    assert_eq!(predict_a, predict_b);
}

#[test]
fn test_nullable_prefix_sets() {
    let grammar = nullable_prefix_grammar();
    let first = first_sets(&grammar);
    let follow = follow_sets(&grammar, "S", &first);
    let predict = predict_sets(&grammar, &first, &follow);

    assert_eq!(first["S"].terminals, BTreeSet::from(["a", "b", "c"]));
    assert!(!first["S"].nullable);
    assert!(first["A"].nullable);
    assert_eq!(follow["A"], BTreeSet::from([Lookahead::Token("b")]));
    assert_eq!(follow["S"], BTreeSet::from([Lookahead::End]));

    let lambda = predict
        .iter()
        .find(|p| p.head == "A" && p.production.is_empty())
        .unwrap();
    assert_eq!(lambda.lookaheads, BTreeSet::from([Lookahead::Token("b")]));
}

#[test]
fn test_conflicting_grammar_is_rejected() {
    // A's λ alternative and its `b` alternative both claim `b`.
    let grammar = Grammar::new("S")
        .rule("S", vec![vec![Nt("A"), Tm("b")]])
        .rule("A", vec![vec![Tm("b")], vec![]]);
    let first = first_sets(&grammar);
    let follow = follow_sets(&grammar, "S", &first);
    let err = build_table(&predict_sets(&grammar, &first, &follow)).unwrap_err();

    assert_eq!(err.nonterminal, "A");
    assert_eq!(err.terminal, "b");
    assert_eq!(err.first, "b");
    assert_eq!(err.second, "λ");
    assert!(err.to_string().starts_with("grammar is not LL(1)"));
}

#[test]
fn test_language_tables_build() {
    let tables = language_tables().unwrap();

    assert_eq!(
        tables.first[&NonTerminal::Program].terminals,
        BTreeSet::from([TokenKind::Dinein])
    );
    assert_eq!(
        tables.follow[&NonTerminal::Program],
        BTreeSet::from([Lookahead::End])
    );
    assert!(tables.follow[&NonTerminal::LocalDec].contains(&Lookahead::Token(TokenKind::Spit)));
    assert!(tables.first[&NonTerminal::StatementBlock].nullable);

    assert_eq!(
        tables.table.get(NonTerminal::Program, Lookahead::Token(TokenKind::Dinein)),
        Some(0)
    );
    assert_eq!(tables.table.get(NonTerminal::Program, Lookahead::End), None);
    assert_eq!(tables.predict.len(), tables.grammar.productions().count());
}

#[test]
fn test_language_tables_are_shared() {
    let first = language_tables().unwrap();
    let second = language_tables().unwrap();
    assert!(std::ptr::eq(first, second));
}

#[test]
fn test_statement_alternatives_are_disjoint() {
    let tables = language_tables().unwrap();
    let statement: Vec<_> = tables
        .predict
        .iter()
        .filter(|p| p.head == NonTerminal::Statement)
        .collect();

    for (i, a) in statement.iter().enumerate() {
        for b in &statement[i + 1..] {
            assert!(
                a.lookaheads.is_disjoint(&b.lookaheads),
                "alternatives {} and {} overlap",
                a.alternative,
                b.alternative
            );
        }
    }
}

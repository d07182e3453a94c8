// Parser tests: tree shape, error reporting and recovery

use dinein::config::RunConfig;
use dinein::parser::grammar::{language_tables, NonTerminal};
use dinein::parser::lexer::{Lexer, Token, TokenKind};
use dinein::parser::parser::{parse, ParseOutcome, SyntaxError};
use dinein::parser::tree::NodeTag;

fn tokens(source: &str) -> Vec<Token> {
    let lexed = Lexer::new(source).tokenize();
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    lexed.tokens
}

fn parse_source(source: &str) -> ParseOutcome {
    let tables = language_tables().unwrap();
    parse(tables, &RunConfig::default(), &tokens(source))
}

fn parse_tokens(stream: &[Token]) -> ParseOutcome {
    parse(language_tables().unwrap(), &RunConfig::default(), stream)
}

/// `stream` with a comma inserted before index `at`
fn with_comma(stream: &[Token], at: usize) -> Vec<Token> {
    let line = stream.get(at).or(stream.last()).map_or(1, |token| token.line);
    let mut mutated = stream.to_vec();
    mutated.insert(at, Token::new(",", TokenKind::Comma, line));
    mutated
}

/// `stream` without the token at index `at`
fn without(stream: &[Token], at: usize) -> Vec<Token> {
    let mut mutated = stream.to_vec();
    mutated.remove(at);
    mutated
}

const SMALL: &str = r#"dinein chef pinch dish() { pinch x = 1; x += 2; serve("x=" + x); spit 0; } takeout"#;

const COUNTDOWN: &str = r#"dinein
pinch total = 0;
full pinch twice(pinch n) {
    spit n * 2;
}
chef pinch dish() {
    pinch i;
    for (i = 3; i > 0; i--) {
        total += twice(i);
    }
    taste (total >= 12 && yum) {
        serve("big " + total);
    } mix {
        serve("small");
    }
    spit 0;
}
takeout
"#;

#[test]
fn test_valid_program_parses() {
    let outcome = parse_source(COUNTDOWN);

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert!(outcome.errors.is_empty());
    let tree = outcome.tree.expect("tree on success");
    assert_eq!(tree.tag, NodeTag::NonTerminal(NonTerminal::Program));
    assert_eq!(tree.line, 1);
}

#[test]
fn test_leaves_reproduce_token_stream() {
    let stream = tokens(COUNTDOWN);
    let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &stream);
    let tree = outcome.tree.expect("tree on success");

    let leaves: Vec<(String, usize)> = tree
        .leaves()
        .iter()
        .map(|leaf| (leaf.value.clone().unwrap_or_default(), leaf.line))
        .collect();
    let expected: Vec<(String, usize)> = stream
        .iter()
        .map(|token| (token.lexeme.clone(), token.line))
        .collect();

    assert_eq!(leaves, expected);
}

#[test]
fn test_tree_display_starts_at_root() {
    let outcome = parse_source("dinein chef pinch dish() { spit 0; } takeout");
    let tree = outcome.tree.expect("tree on success");
    let printed = tree.to_string();

    let mut lines = printed.lines();
    assert_eq!(lines.next(), Some("<program> (Line 1)"));
    assert_eq!(lines.next(), Some("  dinein:dinein (Line 1)"));
    assert!(printed.contains("takeout:takeout (Line 1)"));
}

#[test]
fn test_missing_semicolon_reports_once() {
    let source = "dinein chef pinch dish() {\n    pinch x = 5\n    spit 0;\n} takeout";
    let outcome = parse_source(source);

    assert!(!outcome.success);
    assert!(outcome.tree.is_none());
    assert_eq!(outcome.errors.len(), 1, "errors: {:?}", outcome.errors);

    let message = outcome.errors[0].to_string();
    assert!(message.starts_with("[SYNTAX_ERROR] at line 3:"), "{}", message);
    assert!(message.contains("found 'spit'"), "{}", message);
}

#[test]
fn test_recovery_reports_later_errors() {
    let source = "dinein chef pinch dish() {\n\
                  pinch x = 5\n\
                  x = 3\n\
                  serve(\"a\");\n\
                  spit 0;\n\
                  } takeout";
    let outcome = parse_source(source);

    assert!(!outcome.success);
    let lines: Vec<usize> = outcome.errors.iter().map(SyntaxError::line).collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(outcome.errors.iter().all(|err| !err.is_fatal()));
}

#[test]
fn test_trailing_tokens_are_incomplete() {
    let outcome = parse_source("dinein chef pinch dish() { spit 0; } takeout takeout");

    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(outcome.errors[0], SyntaxError::Incomplete { .. }));
    assert_eq!(outcome.errors[0].to_string(), "Incomplete parsing");
}

#[test]
fn test_garbage_input_terminates() {
    let sources = [
        "} } } } } } } }",
        "takeout dinein",
        "dinein dinein dinein dinein",
        "( ( ( ( ( ( ( (",
        "dinein chef pinch dish() { taste ( ) { } } takeout",
    ];

    for source in sources {
        let outcome = parse_source(source);
        assert!(!outcome.success, "{} should not parse", source);
        assert!(!outcome.errors.is_empty(), "{} produced no errors", source);
        assert!(outcome.tree.is_none());
    }
}

#[test]
fn test_empty_input_is_an_error() {
    let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &[]);

    assert!(!outcome.success);
    assert!(!outcome.errors.is_empty());
    assert!(outcome.errors[0].to_string().contains("found '$'"));
}

#[test]
fn test_error_budget_stops_parsing() {
    let config = RunConfig {
        max_syntax_errors: 2,
        ..RunConfig::default()
    };
    let source = "dinein chef pinch dish() {\n\
                  pinch a = 1\n\
                  pinch b = 2\n\
                  pinch c = 3\n\
                  pinch d = 4\n\
                  spit 0;\n\
                  } takeout";
    let outcome = parse(language_tables().unwrap(), &config, &tokens(source));

    assert!(!outcome.success);
    assert!(outcome.errors.last().is_some_and(SyntaxError::is_fatal));
    assert_eq!(outcome.errors.len(), 3);
}

#[test]
fn test_single_token_faults_report_once() {
    let sources = [
        // stray comma
        r#"dinein chef pinch dish() { pinch x = , 1; x += 2; serve("x=" + x); spit 0; } takeout"#,
        // missing semicolon
        r#"dinein chef pinch dish() { pinch x = 1 x += 2; serve("x=" + x); spit 0; } takeout"#,
        // missing parenthesis
        r#"dinein chef pinch dish() { pinch x = 1; x += 2; serve "x=" + x); spit 0; } takeout"#,
        // missing program opener
        r#"chef pinch dish() { pinch x = 1; x += 2; serve("x=" + x); spit 0; } takeout"#,
        // extra parenthesis
        r#"dinein chef pinch dish()) { pinch x = 1; x += 2; serve("x=" + x); spit 0; } takeout"#,
        // missing closing brace
        r#"dinein chef pinch dish() { pinch x = 1; x += 2; serve("x=" + x); spit 0; takeout"#,
    ];

    for source in sources {
        let outcome = parse_source(source);
        assert!(!outcome.success, "{} should not parse", source);
        assert_eq!(outcome.errors.len(), 1, "{}: {:?}", source, outcome.errors);
        assert!(!outcome.errors[0].is_fatal());
        assert!(outcome.tree.is_none());
    }
}

#[test]
fn test_every_single_token_mutation_reports_at_most_once() {
    let stream = tokens(SMALL);
    let mut mutations: Vec<Vec<Token>> = (0..stream.len()).map(|at| without(&stream, at)).collect();
    mutations.extend((0..=stream.len()).map(|at| with_comma(&stream, at)));

    for mutated in &mutations {
        let outcome = parse_tokens(mutated);
        let source: Vec<&str> = mutated.iter().map(|token| token.lexeme.as_str()).collect();
        if outcome.success {
            // e.g. dropping `pinch` turns the declaration into an assignment
            assert!(outcome.errors.is_empty());
            continue;
        }
        assert_eq!(outcome.errors.len(), 1, "{}: {:?}", source.join(" "), outcome.errors);
        assert!(outcome.tree.is_none());
    }
}

#[test]
fn test_stray_comma_anywhere_reports_once() {
    let stream = tokens(COUNTDOWN);

    for at in 0..=stream.len() {
        let outcome = parse_tokens(&with_comma(&stream, at));
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1, "comma at {}: {:?}", at, outcome.errors);
        assert!(!outcome.errors[0].is_fatal());
    }
}

#[test]
fn test_repair_looks_past_empty_expansions() {
    // `n` ends the right-hand side on `,`, so the tail is already gone
    // when the mismatch against `;` shows up.
    let outcome = parse_source("dinein recipe pinch xs[2]; chef pinch dish() { pinch n = 1; xs[0] = n , + 1; spit 0; } takeout");

    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1, "{:?}", outcome.errors);
    assert!(outcome.errors[0].to_string().contains("found ','"));
}

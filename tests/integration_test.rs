// End-to-end tests for the dinein pipeline

use dinein::config::RunConfig;
use dinein::interpreter::engine::{FAILURE_BANNER, SUCCESS_BANNER};
use dinein::interpreter::{DiagnosticKind, Interpreter, ScriptedInput};
use dinein::memory::value::Value;
use dinein::parser::grammar::language_tables;
use dinein::parser::lexer::Lexer;
use dinein::parser::lower::lower_program;
use dinein::parser::parser::parse;
use dinein::{analyze, Analysis};

fn run(source: &str) -> Analysis {
    run_with(source, &RunConfig::default(), &mut ScriptedInput::empty())
}

fn run_with(source: &str, config: &RunConfig, input: &mut ScriptedInput) -> Analysis {
    let analysis = analyze(source, config, input).expect("pipeline failed");
    assert!(analysis.lex_errors.is_empty(), "lexical errors: {:?}", analysis.lex_errors);
    assert!(
        analysis.syntax_errors.is_empty(),
        "syntax errors: {:?}",
        analysis.syntax_errors
    );
    analysis
}

fn count(analysis: &Analysis, kind: DiagnosticKind) -> usize {
    analysis.diagnostics.iter().filter(|d| d.kind == kind).count()
}

#[test]
fn test_declared_variable_keeps_value() {
    let source = r#"
        dinein
        chef pinch dish() {
            pinch x = 5;
            spit 0;
        }
        takeout
    "#;

    let tokens = Lexer::new(source).tokenize().tokens;
    let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &tokens);
    assert!(outcome.success, "{:?}", outcome.errors);
    let program = lower_program(outcome.tree.as_ref().unwrap()).unwrap();

    let mut input = ScriptedInput::empty();
    let mut interpreter = Interpreter::new(program, RunConfig::default(), &mut input);
    interpreter.run();

    assert!(interpreter.diagnostics().is_empty(), "{:?}", interpreter.diagnostics());
    assert_eq!(interpreter.variable("x"), Some(&Value::Integer(5)));
    assert_eq!(interpreter.result_text(), SUCCESS_BANNER);
}

#[test]
fn test_assignment_to_undeclared_identifier() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            h = 3;
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(analysis.diagnostics.len(), 1, "{:?}", analysis.diagnostics);
    let diagnostic = &analysis.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::UndeclaredIdentifier);
    assert_eq!(diagnostic.identifier.as_deref(), Some("h"));
    assert_eq!(diagnostic.line, Some(4));
    assert_eq!(analysis.result, FAILURE_BANNER);
}

#[test]
fn test_separate_statements_on_one_line_each_report() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            h = 3; h = 3;
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::UndeclaredIdentifier), 2);
}

#[test]
fn test_fault_in_loop_body_reported_once() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            for (pinch i = 0; i < 4; i++) {
                h = i;
            }
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::UndeclaredIdentifier), 1);
    assert_eq!(analysis.diagnostics.len(), 1, "{:?}", analysis.diagnostics);
}

#[test]
fn test_duplicate_function_declaration() {
    let analysis = run(
        r#"
        dinein
        hungry dish2() { }
        hungry dish2() { }
        chef pinch dish() {
            dish2();
            spit 0;
        }
        takeout
    "#,
    );

    let duplicates: Vec<_> = analysis
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DuplicateDeclaration)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].identifier.as_deref(), Some("dish2"));
}

#[test]
fn test_counted_loop_sum() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch sum = 0;
            for (pinch i = 1; i <= 10; i++) {
                sum += i;
            }
            serve(sum);
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["55"]);
    assert_eq!(analysis.result, format!("55\n\n{}", SUCCESS_BANNER));
}

#[test]
fn test_string_assigned_to_pinch_is_type_mismatch() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch n;
            n = "five";
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::TypeMismatch), 1);
    assert_eq!(analysis.diagnostics.len(), 1);
}

#[test]
fn test_no_implicit_widening_in_initializer() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            skim ratio = 3;
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::TypeMismatch), 1);
}

#[test]
fn test_runaway_loop_stops_at_cap() {
    let source = r#"
        dinein
        chef pinch dish() {
            pinch count = 0;
            simmer (yum) {
                count += 1;
            }
            spit 0;
        }
        takeout
    "#;

    let tokens = Lexer::new(source).tokenize().tokens;
    let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &tokens);
    let program = lower_program(outcome.tree.as_ref().unwrap()).unwrap();

    let config = RunConfig::default().with_max_loop_iterations(50);
    let mut input = ScriptedInput::empty();
    let mut interpreter = Interpreter::new(program, config, &mut input);
    interpreter.run();

    assert_eq!(interpreter.variable("count"), Some(&Value::Integer(50)));
    assert_eq!(
        interpreter
            .diagnostics()
            .of_kind(DiagnosticKind::InfiniteLoopRisk)
            .count(),
        1
    );
}

#[test]
fn test_out_of_bounds_does_not_stop_the_run() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            recipe pinch xs[3] = {1, 2, 3};
            pinch y = 0;
            y = xs[3];
            serve("after");
            y = xs[2];
            serve(y);
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::ArrayOutOfBounds), 1);
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.output, vec!["after", "3"]);
    assert_eq!(analysis.result, FAILURE_BANNER);
}

#[test]
fn test_array_element_count_checks() {
    let analysis = run(
        r#"
        dinein
        recipe pinch few[3] = {1};
        recipe pinch many[2] = {1, 2, 3};
        recipe pinch bad[0];
        chef pinch dish() {
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::MissingElements), 1);
    assert_eq!(count(&analysis, DiagnosticKind::TooManyElements), 1);
    assert_eq!(count(&analysis, DiagnosticKind::InvalidArraySize), 1);
}

#[test]
fn test_function_result_and_arguments() {
    let analysis = run(
        r#"
        dinein
        full pinch add(pinch a, pinch b) {
            spit a + b;
        }
        chef pinch dish() {
            pinch r = 0;
            r = add(2, 3);
            serve(r);
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["5"]);
}

#[test]
fn test_arity_errors_skip_the_body() {
    let analysis = run(
        r#"
        dinein
        hungry show(pasta text) {
            serve(text);
        }
        chef pinch dish() {
            show();
            show("a", "b");
            show("ok");
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::MissingArguments), 1);
    assert_eq!(count(&analysis, DiagnosticKind::TooManyArguments), 1);
    assert_eq!(analysis.output, vec!["ok"]);
}

#[test]
fn test_void_function_used_as_value() {
    let analysis = run(
        r#"
        dinein
        hungry greet() {
            serve("hi");
        }
        chef pinch dish() {
            pinch r = 0;
            r = greet();
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::VoidFunction), 1);
    assert!(analysis.output.is_empty());
}

#[test]
fn test_unknown_function_and_non_callable() {
    let analysis = run(
        r#"
        dinein
        pinch value = 1;
        chef pinch dish() {
            missing();
            value();
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::UndeclaredFunction), 1);
    assert_eq!(count(&analysis, DiagnosticKind::NotCallable), 1);
}

#[test]
fn test_unbounded_recursion_hits_call_depth_budget() {
    let source = r#"
        dinein
        full pinch dive(pinch n) {
            spit dive(n);
        }
        chef pinch dish() {
            pinch r = 0;
            r = dive(1);
            spit 0;
        }
        takeout
    "#;

    let config = RunConfig::default().with_max_call_depth(16);
    let analysis = run_with(source, &config, &mut ScriptedInput::empty());

    assert_eq!(count(&analysis, DiagnosticKind::CallDepthExceeded), 1);
    assert_eq!(analysis.diagnostics.len(), 1, "{:?}", analysis.diagnostics);
}

#[test]
fn test_default_call_depth_budget_is_reachable() {
    let source = r#"
        dinein
        full pinch dive(pinch n) {
            pinch r = 0;
            for (pinch i = 0; i < 1; i++) {
                taste (n > 0 && yum) {
                    keepmix {
                        r = dive(n + 1) + 1;
                    } simmer (bleh)
                }
            }
            spit r;
        }
        chef pinch dish() {
            pinch out;
            out = dive(1);
            serve(out);
            spit 0;
        }
        takeout
    "#;

    let config = RunConfig::default();
    let analysis = run_with(source, &config, &mut ScriptedInput::empty());

    assert_eq!(count(&analysis, DiagnosticKind::CallDepthExceeded), 1);
    assert_eq!(analysis.diagnostics.len(), 1, "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec![(config.max_call_depth - 1).to_string()]);
}

#[test]
fn test_functions_cannot_read_entry_locals() {
    let analysis = run(
        r#"
        dinein
        hungry peek() {
            serve("secret=" + secret);
        }
        chef pinch dish() {
            pasta secret = "leaked";
            peek();
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::UndeclaredIdentifier), 1);
    assert!(!analysis.output.iter().any(|line| line.contains("leaked")));
    assert_eq!(analysis.result, FAILURE_BANNER);
}

#[test]
fn test_entry_locals_and_globals_both_inspectable() {
    let source = r#"
        dinein
        pinch g = 7;
        chef pinch dish() {
            pinch g = 1;
            pinch h;
            h = g + 1;
            spit 0;
        }
        takeout
    "#;

    let tokens = Lexer::new(source).tokenize().tokens;
    let outcome = parse(language_tables().unwrap(), &RunConfig::default(), &tokens);
    let program = lower_program(outcome.tree.as_ref().unwrap()).unwrap();

    let mut input = ScriptedInput::empty();
    let mut interpreter = Interpreter::new(program, RunConfig::default(), &mut input);
    interpreter.run();

    assert_eq!(interpreter.global("g"), Some(&Value::Integer(7)));
    assert_eq!(interpreter.variable("g"), Some(&Value::Integer(1)));
    assert_eq!(interpreter.variable("h"), Some(&Value::Integer(2)));
    assert_eq!(interpreter.global("h"), None);
}

#[test]
fn test_for_variable_visible_after_loop() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            for (pinch i = 0; i < 3; i++) {
            }
            serve("i=" + i);
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["i=3".to_string()]);
}

#[test]
fn test_or_operator_evaluates_both_sides() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            taste (bleh ?? yum) {
                serve("or");
            } mix {
                serve("neither");
            }
            taste (yum ?? missing) {
                serve("left");
            } mix {
                serve("skipped");
            }
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(analysis.output.first().map(String::as_str), Some("or"));
    assert_eq!(count(&analysis, DiagnosticKind::UndeclaredIdentifier), 1);
}

#[test]
fn test_function_locals_shadow_globals() {
    let analysis = run(
        r#"
        dinein
        pinch x = 1;
        hungry inner() {
            pasta x = "inner";
            serve(x);
        }
        chef pinch dish() {
            inner();
            serve(x);
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["inner", "1"]);
}

#[test]
fn test_unused_local_is_a_warning() {
    let analysis = run(
        r#"
        dinein
        hungry chat() {
            pinch spare = 1;
            serve("x");
        }
        chef pinch dish() {
            chat();
            chat();
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(analysis.diagnostics.len(), 1);
    let warning = &analysis.diagnostics[0];
    assert_eq!(warning.kind, DiagnosticKind::UnusedVariable);
    assert_eq!(warning.to_string(), "[UNUSED_VARIABLE] Unused local variable 'spare' on line 4");
    assert!(!analysis.has_errors());
    assert_eq!(analysis.result, format!("x\nx\n\n{}", SUCCESS_BANNER));
}

#[test]
fn test_taste_elif_mix_chain() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch score = 75;
            taste (score >= 90) {
                serve("A");
            } elif (score >= 70) {
                serve("B");
            } mix {
                serve("C");
            }
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(analysis.output, vec!["B"]);
}

#[test]
fn test_flip_selects_matching_case() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch day = 2;
            flip (day) {
                case 1: serve("one"); chop;
                case 2: serve("two"); chop;
                default: serve("other"); chop;
            }
            flip (day) {
                case 7: serve("seven"); chop;
                default: serve("fallback"); chop;
            }
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["two", "fallback"]);
}

#[test]
fn test_keepmix_runs_body_first() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch n = 5;
            keepmix {
                n++;
            } simmer (n < 3)
            serve(n);
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(analysis.output, vec!["6"]);
}

#[test]
fn test_non_boolean_condition() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            taste (5) {
                serve("never");
            }
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::InvalidCondition), 1);
    assert!(analysis.output.is_empty());
}

#[test]
fn test_division_by_zero() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch z = 0;
            pinch q = 0;
            q = 10 / z;
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::DivisionByZero), 1);
}

#[test]
fn test_operator_precedence_and_formatting() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch r = 0;
            skim f = 2.0;
            pasta s = "a";
            bool ok = bleh;
            r = 2 + 3 * 4 - 10 / 3;
            f = f / 4;
            s += "b";
            ok = !(r == 11);
            serve("r=" + r + " f=" + f + " s=" + s + " ok=" + ok);
            spit 0;
        }
        takeout
    "#,
    );

    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["r=11 f=0.5 s=ab ok=bleh"]);
}

#[test]
fn test_make_reads_scripted_input() {
    let source = r#"
        dinein
        chef pinch dish() {
            pinch age;
            bool hungry_now;
            make(age);
            make(hungry_now);
            serve("age " + age + " " + hungry_now);
            spit 0;
        }
        takeout
    "#;

    let mut input = ScriptedInput::new(["21", "yum"]);
    let analysis = run_with(source, &RunConfig::default(), &mut input);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(analysis.output, vec!["age 21 yum"]);
    assert_eq!(input.requests, vec!["age", "hungry_now"]);
}

#[test]
fn test_make_rejects_bad_or_cancelled_input() {
    let source = r#"
        dinein
        chef pinch dish() {
            pinch a;
            pinch b;
            make(a);
            make(b);
            spit 0;
        }
        takeout
    "#;

    let mut input = ScriptedInput::new(["not a number"]);
    let analysis = run_with(source, &RunConfig::default(), &mut input);
    assert_eq!(count(&analysis, DiagnosticKind::InvalidValue), 2);
}

#[test]
fn test_unset_value_is_reported() {
    let analysis = run(
        r#"
        dinein
        chef pinch dish() {
            pinch a;
            pinch b = 0;
            b = a + 1;
            spit 0;
        }
        takeout
    "#,
    );

    assert_eq!(count(&analysis, DiagnosticKind::UnsetValue), 1);
}

#[test]
fn test_invalid_termination_code() {
    let analysis = run("dinein chef pinch dish() { spit 1; } takeout");
    assert_eq!(count(&analysis, DiagnosticKind::InvalidTerminationCode), 1);
    assert_eq!(analysis.result, FAILURE_BANNER);
}

#[test]
fn test_lexical_errors_gate_parsing() {
    let analysis = analyze(
        "dinein chef pinch dish() { pinch x = 1 $ spit 0; } takeout",
        &RunConfig::default(),
        &mut ScriptedInput::empty(),
    )
    .unwrap();

    assert_eq!(analysis.lex_errors.len(), 1);
    assert!(analysis.syntax_errors.is_empty());
    assert!(analysis.tree.is_none());
    assert_eq!(analysis.result, FAILURE_BANNER);
}

#[test]
fn test_syntax_errors_gate_execution() {
    let analysis = analyze(
        "dinein chef pinch dish() { serve(\"x\") spit 0; } takeout",
        &RunConfig::default(),
        &mut ScriptedInput::empty(),
    )
    .unwrap();

    assert!(!analysis.syntax_errors.is_empty());
    assert!(analysis.output.is_empty());
    assert!(analysis.diagnostics.is_empty());
    assert!(analysis.has_errors());
}

#[test]
fn test_runs_are_independent() {
    let source = r#"
        dinein
        chef pinch dish() {
            serve("once");
            spit 0;
        }
        takeout
    "#;

    let first = run(source);
    let second = run(source);
    assert_eq!(first.output, vec!["once"]);
    assert_eq!(second.output, vec!["once"]);
}

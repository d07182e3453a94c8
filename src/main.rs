// dinein: LL(1) parser and interpreter for the dinein teaching language

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use crossterm::style::{style, Stylize};
use tracing_subscriber::EnvFilter;

use dinein::config::RunConfig;
use dinein::interpreter::{Diagnostic, InputSource};
use dinein::{analyze_until, Analysis, Error, Stage};

#[derive(Debug, ClapParser)]
#[command(name = "dinein", version, about = "Parse and run dinein programs")]
struct Cli {
    /// Source file to analyze
    file: PathBuf,

    /// Last phase to run
    #[arg(long, value_enum, default_value_t = Stage::Run)]
    stage: Stage,

    /// Print the parse tree after a successful parse
    #[arg(long)]
    tree: bool,

    /// Iterations a loop may run before it is stopped
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Nested calls allowed before a call is refused
    #[arg(long, value_name = "N")]
    max_call_depth: Option<usize>,

    /// Disable coloured diagnostics
    #[arg(long)]
    no_color: bool,
}

/// Reads `make` answers from stdin, prompting on stderr. EOF cancels.
struct StdinInput;

impl InputSource for StdinInput {
    fn read(&mut self, name: &str) -> Option<String> {
        eprint!("Enter a value for '{}': ", name);
        io::stderr().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dinein=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(analysis) if analysis.has_errors() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(err @ Error::Io { .. }) => {
            eprintln!("Error: {}", err);
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<Analysis, Error> {
    let source = fs::read_to_string(&cli.file).map_err(|source| Error::Io {
        path: cli.file.clone(),
        source,
    })?;

    let mut config = RunConfig::default();
    if let Some(max) = cli.max_iterations {
        config = config.with_max_loop_iterations(max);
    }
    if let Some(max) = cli.max_call_depth {
        config = config.with_max_call_depth(max);
    }

    let analysis = analyze_until(&source, cli.stage, &config, &mut StdinInput)?;
    report(cli, &analysis);
    Ok(analysis)
}

fn report(cli: &Cli, analysis: &Analysis) {
    let color = !cli.no_color;

    if cli.stage == Stage::Lex {
        println!("{:<6} {:<16} LEXEME", "LINE", "TOKEN");
        for token in &analysis.tokens {
            println!("{:<6} {:<16} {}", token.line, token.kind.as_str(), token.lexeme);
        }
    }

    for err in &analysis.lex_errors {
        print_error(&err.to_string(), color);
    }
    for err in &analysis.syntax_errors {
        print_error(&err.to_string(), color);
    }

    if cli.tree {
        if let Some(tree) = &analysis.tree {
            print!("{}", tree);
        }
    }

    if cli.stage == Stage::Syntax && analysis.lex_errors.is_empty() && analysis.syntax_errors.is_empty() {
        println!("No syntax errors found");
    }

    if cli.stage != Stage::Run {
        return;
    }

    for diagnostic in &analysis.diagnostics {
        print_diagnostic(diagnostic, color);
    }
    println!("{}", analysis.result);
}

fn print_error(message: &str, color: bool) {
    if color {
        eprintln!("{}", style(message).red());
    } else {
        eprintln!("{}", message);
    }
}

fn print_diagnostic(diagnostic: &Diagnostic, color: bool) {
    let text = diagnostic.to_string();
    match (color, diagnostic.is_error()) {
        (false, _) => eprintln!("{}", text),
        (true, true) => eprintln!("{}", style(text).red()),
        (true, false) => eprintln!("{}", style(text).yellow()),
    }
}

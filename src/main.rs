mod session;

#[cfg(feature = "line")]
mod line_mode;
#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

use anyhow::Result;
use clap::Parser;
use exprcalc::calc_engine::DEFAULT_MAX_DEPTH;
use exprcalc::{Calculator, EvaluationTrace};
use session::{format_number, Session};

/// Terminal calculator for arithmetic expressions with scientific functions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Expression to evaluate once. Without it the interactive calculator starts.
    expression: Option<String>,

    /// Use the line editor instead of the full-screen interface.
    #[arg(short, long)]
    line: bool,

    /// Print every intermediate step of a one-shot evaluation.
    #[arg(short, long)]
    details: bool,

    /// Deepest nesting of parentheses and operators the parser accepts.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let calculator = Calculator::new().with_max_depth(args.max_depth);

    match args.expression {
        Some(expression) => {
            run_once(&calculator, &expression, args.details);
            Ok(())
        }
        None => run_interactive(Session::new(calculator), args.line),
    }
}

fn run_once(calculator: &Calculator, expression: &str, details: bool) {
    let mut trace = EvaluationTrace::new(details);
    match calculator.evaluate_traced(expression, &mut trace) {
        Ok(result) => {
            for (i, step) in trace.steps.iter().enumerate() {
                println!("Step {}: {} = {}", i + 1, step.operation, format_number(step.result));
            }
            println!("{}", format_number(result));
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_interactive(session: Session, line: bool) -> Result<()> {
    #[cfg(feature = "line")]
    if line {
        return line_mode::run_line(session);
    }
    #[cfg(not(feature = "line"))]
    if line {
        log::warn!("built without the `line` feature, starting the default interface");
    }

    #[cfg(feature = "tui")]
    let result = tui_mode::run_tui(session);
    #[cfg(not(feature = "tui"))]
    let result = run_plain(session);
    result
}

#[cfg(not(feature = "tui"))]
fn run_plain(mut session: Session) -> Result<()> {
    use session::Outcome;
    use std::io::{self, BufRead, Write};

    println!("Rust Console Calculator ('help' for functions, 'quit' to exit)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };

        match session.submit(&line?) {
            Outcome::Quit => {
                println!("Goodbye!");
                return Ok(());
            }
            Outcome::Cleared => println!("History cleared"),
            Outcome::Help => {
                let mut names: Vec<&str> = session.environment().names().collect();
                names.sort_unstable();
                println!("Operators: + - * / % ^   Names: {}", names.join(", "));
            }
            Outcome::Ignored => {}
            Outcome::Evaluated => {
                if let Some(entry) = session.history.last() {
                    print_entry(&session, entry);
                }
            }
        }
    }
}

#[cfg(not(feature = "tui"))]
fn print_entry(session: &Session, entry: &session::HistoryEntry) {
    let formatted_expr = session.pretty(&entry.input);
    match &entry.result {
        Ok(result) => println!("  {} = {}", formatted_expr, format_number(*result)),
        Err(e) => println!("  {} = Error: {}", formatted_expr, e),
    }
    if entry.detailed_mode {
        for (i, step) in entry.detailed_steps.iter().enumerate() {
            println!("  Step {}: {} = {}", i + 1, step.operation, format_number(step.result));
        }
        println!("  Time: {:.6} ms", entry.duration.as_secs_f64() * 1000.0);
    }
}

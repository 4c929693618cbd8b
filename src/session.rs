use std::time::{Duration, Instant};

use exprcalc::calc_engine::{Environment, EvaluationTrace, Step};
use exprcalc::{CalcError, Calculator};
use log::debug;

/// Name under which the previous result is visible to the next expression.
pub const ANSWER: &str = "ans";

pub struct HistoryEntry {
    pub input: String,
    pub result: Result<f64, CalcError>,
    pub detailed_steps: Vec<Step>,
    pub detailed_mode: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Quit,
    Cleared,
    Help,
    /// A new entry was pushed onto the history.
    Evaluated,
}

/// State owned by one interactive run: the calculator (with `ans` bound
/// once something has been computed) and the list of past evaluations.
pub struct Session {
    calculator: Calculator,
    base_env: Environment,
    pub history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new(calculator: Calculator) -> Self {
        let base_env = calculator.environment().clone();
        Session {
            calculator,
            base_env,
            history: Vec::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        self.calculator.environment()
    }

    pub fn submit(&mut self, input: &str) -> Outcome {
        let input = input.trim();
        if input.is_empty() {
            return Outcome::Ignored;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "q" => return Outcome::Quit,
            "clear" | "reset" => {
                self.clear();
                return Outcome::Cleared;
            }
            "help" => return Outcome::Help,
            _ => {}
        }

        let (detailed_mode, processed_input) = split_details(input);

        let start_time = Instant::now();
        let mut trace = EvaluationTrace::new(detailed_mode);
        let result = self.calculator.evaluate_traced(processed_input, &mut trace);
        let duration = start_time.elapsed();

        match &result {
            Ok(value) => self.bind_answer(*value),
            Err(e) => debug!("'{}' rejected: {}", processed_input, e),
        }

        self.history.push(HistoryEntry {
            input: processed_input.to_string(),
            result,
            detailed_steps: trace.steps,
            detailed_mode,
            duration,
        });
        Outcome::Evaluated
    }

    /// Evaluates `input` as `submit` would, without touching history or `ans`.
    /// Commands and blank input have no preview.
    #[cfg(feature = "tui")]
    pub fn preview(&self, input: &str) -> Option<Result<f64, CalcError>> {
        let input = input.trim();
        if input.is_empty() || is_command(input) {
            return None;
        }
        let (_, expression) = split_details(input);
        Some(self.calculator.evaluate(expression))
    }

    pub fn clear(&mut self) {
        self.history.clear();
        let calculator = std::mem::take(&mut self.calculator);
        self.calculator = calculator.with_environment(self.base_env.clone());
    }

    /// Canonical spacing for display; input that does not parse is only
    /// whitespace-normalized.
    pub fn pretty(&self, input: &str) -> String {
        match self.calculator.parse(input) {
            Ok(expr) => expr.to_string(),
            Err(_) => input.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    fn bind_answer(&mut self, value: f64) {
        let calculator = std::mem::take(&mut self.calculator);
        let env = self.base_env.clone().with_constant(ANSWER, value);
        self.calculator = calculator.with_environment(env);
    }
}

#[cfg(feature = "tui")]
fn is_command(input: &str) -> bool {
    ["quit", "exit", "q", "clear", "reset", "help"]
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}

/// `details <expr>` and `<expr> details` ask for the step list.
fn split_details(input: &str) -> (bool, &str) {
    const KEYWORD: &str = "details";

    if let Some(prefix) = input.get(..KEYWORD.len() + 1) {
        if prefix.eq_ignore_ascii_case("details ") {
            return (true, input[prefix.len()..].trim());
        }
    }
    if let Some(split) = input.len().checked_sub(KEYWORD.len() + 1) {
        if let Some(suffix) = input.get(split..) {
            if suffix.eq_ignore_ascii_case(" details") {
                return (true, input[..split].trim());
            }
        }
    }
    (false, input)
}

pub fn format_number(x: f64) -> String {
    if x.abs() > 1e10 || (x.abs() < 1e-5 && x != 0.0) {
        format!("{:.6e}", x)
    } else {
        let s = format!("{:.6}", x);
        s.trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exprcalc::calc_engine::EvalError;

    fn session() -> Session {
        Session::new(Calculator::new())
    }

    #[test]
    fn commands_are_not_evaluated() {
        let mut s = session();
        assert_eq!(s.submit("  "), Outcome::Ignored);
        assert_eq!(s.submit("QUIT"), Outcome::Quit);
        assert_eq!(s.submit("help"), Outcome::Help);
        assert!(s.history.is_empty());
    }

    #[test]
    fn answer_carries_to_next_expression() {
        let mut s = session();
        assert_eq!(s.submit("6 * 7"), Outcome::Evaluated);
        s.submit("ans / 2");
        assert_eq!(s.history.last().map(|e| e.result.clone()), Some(Ok(21.0)));

        s.submit("1 / 0");
        s.submit("ans + 1");
        assert_eq!(s.history.last().map(|e| e.result.clone()), Some(Ok(22.0)));
    }

    #[test]
    fn reset_forgets_history_and_answer() {
        let mut s = session();
        s.submit("2 + 2");
        assert_eq!(s.submit("reset"), Outcome::Cleared);
        assert!(s.history.is_empty());

        s.submit("ans");
        assert!(matches!(
            s.history.last().map(|e| &e.result),
            Some(Err(CalcError::Eval(EvalError::UnknownIdentifier { .. })))
        ));
    }

    #[test]
    fn details_records_steps() {
        let mut s = session();
        s.submit("details 2 * (3 + 4)");
        let entry = s.history.last().unwrap();
        assert!(entry.detailed_mode);
        assert_eq!(entry.input, "2 * (3 + 4)");
        assert_eq!(entry.detailed_steps.len(), 2);

        s.submit("sqrt(16) DETAILS");
        let entry = s.history.last().unwrap();
        assert!(entry.detailed_mode);
        assert_eq!(entry.input, "sqrt(16)");

        s.submit("1 + 1");
        assert!(!s.history.last().unwrap().detailed_mode);
    }

    #[test]
    #[cfg(feature = "tui")]
    fn preview_leaves_session_untouched() {
        let mut s = session();
        s.submit("5");
        assert_eq!(s.preview("details ans * 2"), Some(Ok(10.0)));
        assert!(matches!(s.preview("2 +"), Some(Err(CalcError::Parse(_)))));
        assert_eq!(s.preview("Help"), None);
        assert_eq!(s.preview(""), None);
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.preview("ans"), Some(Ok(5.0)));
    }

    #[test]
    fn split_details_handles_multibyte_input() {
        assert_eq!(split_details("ééééééééé"), (false, "ééééééééé"));
        assert_eq!(split_details("details"), (false, "details"));
    }

    #[test]
    fn pretty_normalizes_spacing() {
        let s = session();
        assert_eq!(s.pretty("2+3*4"), "2 + 3 * 4");
        assert_eq!(s.pretty("2 +   ;"), "2 + ;");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(1e12), "1.000000e12");
    }
}

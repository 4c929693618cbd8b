//! Restricted arithmetic expression engine.
//!
//! Text goes through three stages: [`lexer::tokenize`] produces tokens,
//! [`parser::Parser`] builds an [`ast::Expr`], and [`evaluator::evaluate`]
//! walks the tree against an [`environment::Environment`]. Only the
//! operators and the functions bound in the environment can ever run.

pub mod ast;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;

use log::debug;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use environment::{Binding, Callable, Environment};
pub use error::{CalcError, EvalError, LexError, ParseError};
pub use evaluator::{evaluate, evaluate_traced};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, Parser, DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEIGHT};

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub operation: String,
    pub result: f64,
}

/// Intermediate operations recorded during an evaluation. Nothing is
/// recorded unless `detailed_mode` is set.
#[derive(Debug, Clone, Default)]
pub struct EvaluationTrace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl EvaluationTrace {
    pub fn new(detailed_mode: bool) -> Self {
        EvaluationTrace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    pub fn add_step(&mut self, operation: String, result: f64) {
        if self.detailed_mode {
            self.steps.push(Step { operation, result });
        }
    }
}

/// An environment plus parser settings. Holds no per-call state, so one
/// instance can evaluate any number of expressions.
#[derive(Debug, Clone)]
pub struct Calculator {
    env: Environment,
    max_depth: usize,
}

impl Calculator {
    pub fn new() -> Self {
        Calculator {
            env: Environment::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn parse(&self, text: &str) -> Result<Expr, CalcError> {
        let tokens = tokenize(text)?;
        let expr = Parser::new(tokens).with_max_depth(self.max_depth).parse()?;
        Ok(expr)
    }

    pub fn evaluate(&self, text: &str) -> Result<f64, CalcError> {
        self.evaluate_traced(text, &mut EvaluationTrace::new(false))
    }

    pub fn evaluate_traced(&self, text: &str, trace: &mut EvaluationTrace) -> Result<f64, CalcError> {
        let expr = self.parse(text)?;
        let value = evaluate_traced(&expr, &self.env, trace)?;
        debug!("{} = {}", expr, value);
        Ok(value)
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator::new()
    }
}

/// Evaluates `text` with the default functions and constants.
pub fn evaluate_expression(text: &str) -> Result<f64, CalcError> {
    Calculator::new().evaluate(text)
}

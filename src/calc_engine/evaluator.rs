use log::{debug, trace};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::environment::{Binding, Environment};
use super::error::EvalError;
use super::EvaluationTrace;

/// Evaluates `expr` against `env`. The result is always finite.
pub fn evaluate(expr: &Expr, env: &Environment) -> Result<f64, EvalError> {
    evaluate_traced(expr, env, &mut EvaluationTrace::new(false))
}

/// Like [`evaluate`], recording each intermediate operation into `trace`.
pub fn evaluate_traced(
    expr: &Expr,
    env: &Environment,
    trace: &mut EvaluationTrace,
) -> Result<f64, EvalError> {
    let result = Evaluator { env, trace }.eval(expr);
    if let Err(e) = &result {
        debug!("evaluation of '{}' failed: {}", expr, e);
    }
    result
}

struct Evaluator<'a> {
    env: &'a Environment,
    trace: &'a mut EvaluationTrace,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<f64, EvalError> {
        let value = match expr {
            Expr::Literal(value) => *value,
            Expr::Variable(name) => self.constant(name)?,
            Expr::Unary(UnaryOp::Neg, operand) => {
                let value = self.eval(operand)?;
                self.record(format!("-{}", value), -value);
                -value
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                let result = apply(*op, left, right)?;
                self.record(format!("{} {} {}", left, op.symbol(), right), result);
                result
            }
            Expr::Call(name, args) => self.call(name, args)?,
        };

        finite(value)
    }

    fn constant(&mut self, name: &str) -> Result<f64, EvalError> {
        let env = self.env;
        match env.get(name) {
            Some(Binding::Constant(value)) => {
                self.record(name.to_string(), *value);
                Ok(*value)
            }
            Some(Binding::Function(_)) => Err(EvalError::NotAConstant {
                name: name.to_string(),
            }),
            None => Err(EvalError::UnknownIdentifier {
                name: name.to_string(),
            }),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<f64, EvalError> {
        let env = self.env;
        let overloads = match env.get(name) {
            Some(Binding::Function(overloads)) => overloads,
            Some(Binding::Constant(_)) => {
                return Err(EvalError::NotCallable {
                    name: name.to_string(),
                })
            }
            None => {
                return Err(EvalError::UnknownIdentifier {
                    name: name.to_string(),
                })
            }
        };

        let callable = overloads
            .iter()
            .find(|c| c.arity() == args.len())
            .ok_or_else(|| EvalError::ArityMismatch {
                name: name.to_string(),
                expected: overloads.iter().map(|c| c.arity()).collect(),
                found: args.len(),
            })?;

        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let result = callable
            .call(&values)
            .map_err(|message| EvalError::DomainError {
                function: name.to_string(),
                message,
            })?;

        let args_str = values
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.record(format!("{}({})", name, args_str), result);
        Ok(result)
    }

    fn record(&mut self, operation: String, result: f64) {
        trace!("{} = {}", operation, result);
        self.trace.add_step(operation, result);
    }
}

fn apply(op: BinaryOp, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div if right == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Div => Ok(left / right),
        BinaryOp::Rem if right == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Rem => Ok(left % right),
        BinaryOp::Pow if left < 0.0 && right.fract() != 0.0 => Err(EvalError::ComplexResult {
            base: left,
            exponent: right,
        }),
        BinaryOp::Pow => Ok(left.powf(right)),
    }
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFiniteResult)
    }
}

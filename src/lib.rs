//! Arithmetic expression calculator.
//!
//! ```
//! assert_eq!(exprcalc::evaluate_expression("sqrt(16) + 2^3"), Ok(12.0));
//! ```

pub mod calc_engine;

pub use calc_engine::{evaluate_expression, CalcError, Calculator, EvaluationTrace};

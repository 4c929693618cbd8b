use thiserror::Error;

/// Failure while splitting the input into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unknown character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("Invalid number '{literal}' at position {position}")]
    MalformedNumber { literal: String, position: usize },
}

/// Failure while building the expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Empty expression at position {position}")]
    EmptyExpression { position: usize },

    #[error("Unmatched parenthesis at position {position}")]
    UnmatchedParenthesis { position: usize },

    #[error("Expression is nested too deeply (limit {limit})")]
    TooDeep { limit: usize },
}

/// Failure while walking the tree against an environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Unknown identifier '{name}'")]
    UnknownIdentifier { name: String },

    #[error("'{name}' is a function, call it as {name}(...)")]
    NotAConstant { name: String },

    #[error("'{name}' is a constant and cannot be called")]
    NotCallable { name: String },

    #[error("{name}() takes {} argument(s), got {found}", join_arities(.expected))]
    ArityMismatch {
        name: String,
        expected: Vec<usize>,
        found: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{function} domain: {message}")]
    DomainError { function: String, message: String },

    #[error("{base} ^ {exponent} has no real value")]
    ComplexResult { base: f64, exponent: f64 },

    #[error("Result is not a finite number")]
    NonFiniteResult,
}

/// Any error the pipeline can produce. Exactly one is reported per call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

fn join_arities(arities: &[usize]) -> String {
    arities
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

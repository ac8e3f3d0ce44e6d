//! Error types for expression evaluation and Newton iteration.
//!
//! - `SyntaxError`: the expression text does not match the supported grammar.
//! - `DomainError`: evaluation produced a value that is not a finite real.
//! - `EvalError`: either of the above, returned by every evaluation entry point.
//! - `SolverError`: failures that prevent an iteration driver from starting at all.

use serde::Serialize;
use thiserror::Error;

/// The expression could not be tokenized, parsed or resolved.
///
/// Positions are byte offsets into the source expression string.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntaxError {
    #[error("Expression is empty")]
    Empty,
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("Invalid number literal '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },
    #[error("Unknown identifier '{name}' at position {position}")]
    UnknownIdentifier { name: String, position: usize },
    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },
    #[error("Function '{name}' at position {position} must be followed by '('")]
    MissingArgument { name: String, position: usize },
    #[error("Unexpected '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Missing ')' for '(' at position {position}")]
    UnclosedParen { position: usize },
    #[error("Expression is nested too deeply at position {position}")]
    TooDeep { position: usize },
    #[error("Malformed program")]
    Malformed,
}

/// Evaluation left the real numbers.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("{function}({argument}) is undefined")]
    OutOfDomain {
        function: &'static str,
        argument: f64,
    },
    #[error("'{operation}' produced a non-finite value")]
    NonFinite { operation: &'static str },
    #[error("Input value {value} is not finite")]
    NonFiniteInput { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EvalError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl EvalError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, EvalError::Syntax(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, EvalError::Domain(_))
    }
}

/// Errors that stop `iterate`/`analyze` before the first Newton step.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The equation failed to parse, or could not be evaluated at the initial guess.
    #[error(transparent)]
    Equation(#[from] EvalError),
    /// A tolerance, step size or iteration cap was rejected.
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] anyhow::Error),
}

impl From<SyntaxError> for SolverError {
    fn from(err: SyntaxError) -> Self {
        SolverError::Equation(EvalError::Syntax(err))
    }
}

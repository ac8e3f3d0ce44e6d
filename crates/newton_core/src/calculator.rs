use crate::equation_engine::{Equation, Placeholder};
use crate::errors::{EvalError, SyntaxError};
use crate::newton::NewtonTrace;
use serde::{Deserialize, Serialize};

/// `Ans` of a freshly switched-on calculator: the usual first guess for x^3 - 7.
pub const DEFAULT_ANS: f64 = 2.0;
/// A typed answer counts as the root when it is this close to the trace's final x.
pub const ANSWER_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: f64,
}

/// Calculator state owned by the driver: the current `Ans`, the last
/// expression for repeated `=` presses, and the results so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSession {
    ans: f64,
    last_expression: Option<String>,
    history: Vec<HistoryEntry>,
}

impl Default for CalculatorSession {
    fn default() -> Self {
        Self::new(DEFAULT_ANS)
    }
}

impl CalculatorSession {
    pub fn new(initial_ans: f64) -> Self {
        Self {
            ans: initial_ans,
            last_expression: None,
            history: Vec::new(),
        }
    }

    pub fn ans(&self) -> f64 {
        self.ans
    }

    pub fn last_expression(&self) -> Option<&str> {
        self.last_expression.as_deref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Evaluates `expression` with `Ans` bound to the current answer.
    ///
    /// On success the result becomes the new `Ans`. On failure nothing changes.
    pub fn evaluate(&mut self, expression: &str) -> Result<f64, EvalError> {
        let result =
            Equation::with_placeholder(expression, Placeholder::Ans)?.evaluate(self.ans)?;
        self.ans = result;
        self.last_expression = Some(expression.to_string());
        self.history.push(HistoryEntry {
            expression: expression.to_string(),
            result,
        });
        Ok(result)
    }

    /// Re-evaluates the last successful expression against the new `Ans`.
    ///
    /// Pressing `=` repeatedly on `Ans - (Ans^3 - 7)/(3*Ans^2)` walks the Newton iterates.
    pub fn repeat(&mut self) -> Result<f64, EvalError> {
        let expression = self.last_expression.clone().ok_or(SyntaxError::Empty)?;
        self.evaluate(&expression)
    }

    /// Forgets the pending expression (the `AC` key). `Ans` survives.
    pub fn clear(&mut self) {
        self.last_expression = None;
    }
}

/// True when `value` matches the root the trace converged to.
pub fn check_answer(value: f64, trace: &NewtonTrace) -> bool {
    trace
        .last()
        .is_some_and(|step| (value - step.x).abs() < ANSWER_TOLERANCE)
}

use crate::equation_engine::Equation;
use crate::errors::{DomainError, EvalError};
use crate::traits::ScalarFunction;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Step used for the central difference when none is configured.
pub const DEFAULT_DERIVATIVE_STEP: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativeSettings {
    /// Half-width `h` of the central difference. Wider steps trade cancellation
    /// error for truncation error near inflection points.
    pub step: f64,
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self {
            step: DEFAULT_DERIVATIVE_STEP,
        }
    }
}

impl DerivativeSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            bail!("derivative step must be positive and finite.");
        }
        Ok(())
    }
}

/// Approximates f'(x) with `(f(x + h) - f(x - h)) / 2h`.
///
/// Either evaluation failing fails the derivative; nothing is masked.
pub fn central_difference(function: &impl ScalarFunction, x: f64, h: f64) -> Result<f64, EvalError> {
    let forward = function.eval(x + h)?;
    let backward = function.eval(x - h)?;
    let slope = (forward - backward) / (2.0 * h);
    if !slope.is_finite() {
        return Err(DomainError::NonFinite {
            operation: "derivative",
        }
        .into());
    }
    Ok(slope)
}

/// Parses `expression` as a function of `x` and differentiates it numerically at `x`.
pub fn derivative(expression: &str, x: f64, h: f64) -> Result<f64, EvalError> {
    let equation = Equation::parse(expression)?;
    central_difference(&equation, x, h)
}

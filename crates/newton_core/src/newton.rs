//! Bounded Newton-Raphson iteration producing a replayable trace.

use crate::derivative::{central_difference, DerivativeSettings};
use crate::equation_engine::Equation;
use crate::errors::{EvalError, SolverError};
use crate::traits::ScalarFunction;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationSettings {
    /// Maximum number of recorded steps, including the initial guess.
    pub max_steps: usize,
    /// The trace ends as soon as |f(x)| drops below this.
    pub tolerance: f64,
    pub derivative: DerivativeSettings,
}

impl Default for IterationSettings {
    fn default() -> Self {
        Self {
            max_steps: 10,
            tolerance: 1e-4,
            derivative: DerivativeSettings::default(),
        }
    }
}

impl IterationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            bail!("max_steps must be greater than zero.");
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            bail!("tolerance must be positive.");
        }
        self.derivative.validate()
    }
}

/// One iterate together with the residual and slope measured there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonStep {
    pub x: f64,
    pub fx: f64,
    pub fpx: f64,
}

impl NewtonStep {
    /// Where the tangent at this step meets the x-axis; `None` for a flat tangent.
    pub fn next_x(&self) -> Option<f64> {
        if self.fpx == 0.0 {
            return None;
        }
        Some(self.x - self.fx / self.fpx)
    }
}

/// Why a trace stopped growing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// |f(x)| fell below the tolerance at the last step.
    RootFound,
    /// f'(x) was exactly zero at the last step, so no tangent intercept exists.
    DegenerateDerivative,
    /// The step cap was reached.
    StepLimit,
    /// f or f' could not be evaluated at the next iterate.
    DivergedEvaluation { error: EvalError },
}

/// Recorded iterates. `newton_trace` always returns at least one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewtonTrace {
    pub steps: Vec<NewtonStep>,
    pub termination: Termination,
}

impl NewtonTrace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&NewtonStep> {
        self.steps.last()
    }

    /// The final iterate when the trace ended on a root.
    pub fn root(&self) -> Option<f64> {
        match self.termination {
            Termination::RootFound => self.last().map(|step| step.x),
            _ => None,
        }
    }
}

/// Runs Newton's method from `x0`, recording every iterate.
///
/// Each recorded step holds f and f' evaluated at that step's x with the same
/// function. If evaluation fails at `x0` this is `SolverError::Equation`; a later
/// failure keeps the steps gathered so far and reports `DivergedEvaluation`.
pub fn newton_trace(
    function: &impl ScalarFunction,
    x0: f64,
    settings: &IterationSettings,
) -> std::result::Result<NewtonTrace, SolverError> {
    settings.validate()?;
    if !x0.is_finite() {
        return Err(SolverError::InvalidSettings(anyhow::anyhow!(
            "initial guess must be finite."
        )));
    }

    let mut steps = Vec::with_capacity(settings.max_steps);
    let mut x = x0;

    for step in 0..settings.max_steps {
        let (fx, fpx) = match evaluate_point(function, x, settings.derivative.step) {
            Ok(values) => values,
            Err(error) if steps.is_empty() => return Err(error.into()),
            Err(error) => {
                return Ok(NewtonTrace {
                    steps,
                    termination: Termination::DivergedEvaluation { error },
                })
            }
        };
        steps.push(NewtonStep { x, fx, fpx });

        if fx.abs() < settings.tolerance {
            return Ok(NewtonTrace {
                steps,
                termination: Termination::RootFound,
            });
        }
        if fpx == 0.0 {
            return Ok(NewtonTrace {
                steps,
                termination: Termination::DegenerateDerivative,
            });
        }
        if step + 1 == settings.max_steps {
            break;
        }
        x -= fx / fpx;
    }

    Ok(NewtonTrace {
        steps,
        termination: Termination::StepLimit,
    })
}

/// Parses `expression` as a function of `x` and builds its Newton trace.
pub fn iterate(
    expression: &str,
    x0: f64,
    settings: &IterationSettings,
) -> std::result::Result<NewtonTrace, SolverError> {
    let equation = Equation::parse(expression)?;
    newton_trace(&equation, x0, settings)
}

pub(crate) fn evaluate_point(
    function: &impl ScalarFunction,
    x: f64,
    h: f64,
) -> std::result::Result<(f64, f64), EvalError> {
    let fx = function.eval(x)?;
    let fpx = central_difference(function, x, h)?;
    Ok((fx, fpx))
}

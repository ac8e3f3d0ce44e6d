use crate::derivative::{central_difference, DerivativeSettings};
use crate::equation_engine::Equation;
use crate::errors::{EvalError, SolverError};
use crate::newton::evaluate_point;
use crate::traits::ScalarFunction;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this |f'(x0)| the starting point is flagged regardless of the outcome.
pub const SMALL_DERIVATIVE_THRESHOLD: f64 = 0.1;
/// Above this |f'(x0)| the starting point is flagged regardless of the outcome.
pub const LARGE_DERIVATIVE_THRESHOLD: f64 = 10.0;
pub const FAST_CONVERGENCE_ITERATIONS: usize = 10;
pub const FAIR_CONVERGENCE_ITERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub max_steps: usize,
    /// Converged once |f(x)| drops below this.
    pub residual_tolerance: f64,
    /// Converged once successive iterates are closer than this.
    pub step_tolerance: f64,
    /// Gives up once |f'(x)| drops below this.
    pub derivative_floor: f64,
    pub derivative: DerivativeSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            residual_tolerance: 1e-4,
            step_tolerance: 1e-4,
            derivative_floor: 1e-4,
            derivative: DerivativeSettings::default(),
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            bail!("max_steps must be greater than zero.");
        }
        if !self.residual_tolerance.is_finite() || self.residual_tolerance <= 0.0 {
            bail!("residual_tolerance must be positive.");
        }
        if !self.step_tolerance.is_finite() || self.step_tolerance <= 0.0 {
            bail!("step_tolerance must be positive.");
        }
        if !self.derivative_floor.is_finite() || self.derivative_floor < 0.0 {
            bail!("derivative_floor must be non-negative.");
        }
        self.derivative.validate()
    }
}

/// Verdict on an initial guess. Variants are listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    DerivativeTooSmall,
    DerivativeTooLarge,
    FastConvergence,
    FairConvergence,
    SlowConvergence,
    NoConvergence,
}

impl Classification {
    /// First matching rule wins; the derivative at the start outranks how the run went.
    pub fn classify(derivative_at_start: f64, converged: bool, iterations: usize) -> Self {
        let slope = derivative_at_start.abs();
        if slope < SMALL_DERIVATIVE_THRESHOLD {
            Classification::DerivativeTooSmall
        } else if slope > LARGE_DERIVATIVE_THRESHOLD {
            Classification::DerivativeTooLarge
        } else if converged && iterations <= FAST_CONVERGENCE_ITERATIONS {
            Classification::FastConvergence
        } else if converged && iterations <= FAIR_CONVERGENCE_ITERATIONS {
            Classification::FairConvergence
        } else if converged {
            Classification::SlowConvergence
        } else {
            Classification::NoConvergence
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::DerivativeTooSmall => {
                "derivative too small, may converge slowly or diverge"
            }
            Classification::DerivativeTooLarge => "derivative too large, may oscillate",
            Classification::FastConvergence => "good starting point, fast convergence",
            Classification::FairConvergence => "fairly good starting point",
            Classification::SlowConvergence => "slow convergence, try another point",
            Classification::NoConvergence => "does not converge, choose another point",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The condition that ended the analysis loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisStop {
    ResidualTolerance,
    StepTolerance,
    DerivativeFloor,
    StepLimit,
    DivergedEvaluation { error: EvalError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub converged: bool,
    pub iterations: usize,
    pub final_value: f64,
    pub derivative_at_start: f64,
    pub classification: Classification,
    pub stop: AnalysisStop,
}

/// Diagnoses how well Newton's method behaves from `x0`.
///
/// Unlike `newton_trace`, successive iterates closer than `step_tolerance`
/// count as convergence and a slope under `derivative_floor` aborts. The slope
/// at `x0` used for classification is computed on its own, before the loop.
pub fn analyze_initial_point(
    function: &impl ScalarFunction,
    x0: f64,
    settings: &AnalysisSettings,
) -> std::result::Result<ConvergenceReport, SolverError> {
    settings.validate()?;
    if !x0.is_finite() {
        return Err(SolverError::InvalidSettings(anyhow::anyhow!(
            "initial guess must be finite."
        )));
    }
    let derivative_at_start = central_difference(function, x0, settings.derivative.step)?;

    let mut x = x0;
    let mut iterations = 0usize;
    let mut stop = AnalysisStop::StepLimit;

    for i in 0..settings.max_steps {
        let (fx, fpx) = match evaluate_point(function, x, settings.derivative.step) {
            Ok(values) => values,
            Err(error) => {
                stop = AnalysisStop::DivergedEvaluation { error };
                break;
            }
        };

        if fx.abs() < settings.residual_tolerance {
            iterations = i + 1;
            stop = AnalysisStop::ResidualTolerance;
            break;
        }
        if fpx.abs() < settings.derivative_floor || fpx == 0.0 {
            stop = AnalysisStop::DerivativeFloor;
            break;
        }

        let next = x - fx / fpx;
        iterations = i + 1;
        if (next - x).abs() < settings.step_tolerance {
            x = next;
            stop = AnalysisStop::StepTolerance;
            break;
        }
        x = next;
    }

    let converged = matches!(
        stop,
        AnalysisStop::ResidualTolerance | AnalysisStop::StepTolerance
    );

    Ok(ConvergenceReport {
        converged,
        iterations,
        final_value: x,
        derivative_at_start,
        classification: Classification::classify(derivative_at_start, converged, iterations),
        stop,
    })
}

/// Parses `expression` as a function of `x` and analyzes the starting point `x0`.
pub fn analyze(
    expression: &str,
    x0: f64,
    settings: &AnalysisSettings,
) -> std::result::Result<ConvergenceReport, SolverError> {
    let equation = Equation::parse(expression)?;
    analyze_initial_point(&equation, x0, settings)
}

use crate::newton::NewtonStep;
use crate::traits::ScalarFunction;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveAxisSpec {
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Sampled curve of f split into polylines.
///
/// A sample where f cannot be evaluated ends the current polyline, so poles and
/// gaps in the domain are not bridged by a straight line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveGeometry {
    pub polylines: Vec<Vec<[f64; 2]>>,
}

impl CurveGeometry {
    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(Vec::len).sum()
    }
}

pub fn sample_curve(function: &impl ScalarFunction, axis: &CurveAxisSpec) -> Result<CurveGeometry> {
    if !axis.min.is_finite() || !axis.max.is_finite() {
        bail!("Curve range must be finite.");
    }
    if axis.min >= axis.max {
        bail!("Curve range min ({}) must be below max ({}).", axis.min, axis.max);
    }
    if axis.samples < 2 {
        bail!("Curve requires at least 2 samples.");
    }

    let spacing = (axis.max - axis.min) / (axis.samples - 1) as f64;
    let mut geometry = CurveGeometry::default();
    let mut current: Vec<[f64; 2]> = Vec::new();

    for i in 0..axis.samples {
        let x = if i + 1 == axis.samples {
            axis.max
        } else {
            axis.min + spacing * i as f64
        };
        match function.eval(x) {
            Ok(y) => current.push([x, y]),
            Err(_) => {
                if !current.is_empty() {
                    geometry.polylines.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        geometry.polylines.push(current);
    }
    Ok(geometry)
}

/// Endpoints of the tangent `y = fx + fpx (t - x)` over `[x - half_width, x + half_width]`.
///
/// `None` for a flat tangent, which never reaches the axis and is not drawn.
pub fn tangent_segment(step: &NewtonStep, half_width: f64) -> Option<[[f64; 2]; 2]> {
    if step.fpx == 0.0 || !half_width.is_finite() || half_width <= 0.0 {
        return None;
    }
    let left = step.x - half_width;
    let right = step.x + half_width;
    Some([
        [left, step.fx + step.fpx * (left - step.x)],
        [right, step.fx + step.fpx * (right - step.x)],
    ])
}

/// Where the tangent at `step` crosses the x-axis.
pub fn next_intercept(step: &NewtonStep) -> Option<f64> {
    step.next_x()
}

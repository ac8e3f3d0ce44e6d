//! Equation wrapper: evaluation, Newton traces, starting-point analysis and curve sampling.

use crate::shared::{js_error, settings_from_js, to_js};
use newton_core::analysis::{
    analyze_initial_point, AnalysisSettings, AnalysisStop, Classification, ConvergenceReport,
};
use newton_core::derivative::{central_difference, DerivativeSettings, DEFAULT_DERIVATIVE_STEP};
use newton_core::equation_engine::Equation;
use newton_core::newton::{newton_trace, IterationSettings, NewtonStep, NewtonTrace, Termination};
use newton_core::plot::{sample_curve, CurveAxisSpec};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEquation {
    equation: Equation,
}

/// Trace as handed to the canvas and the steps table.
#[derive(Debug, Serialize)]
pub(crate) struct TracePayload {
    steps: Vec<NewtonStep>,
    termination: Termination,
    /// Human-readable reason when evaluation broke off the trace.
    message: Option<String>,
}

impl From<&NewtonTrace> for TracePayload {
    fn from(trace: &NewtonTrace) -> Self {
        let message = match &trace.termination {
            Termination::DivergedEvaluation { error } => Some(error.to_string()),
            _ => None,
        };
        Self {
            steps: trace.steps.clone(),
            termination: trace.termination.clone(),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalysisPayload {
    converged: bool,
    iterations: usize,
    final_value: f64,
    derivative_at_start: f64,
    classification: Classification,
    label: &'static str,
    stop: AnalysisStop,
}

impl From<ConvergenceReport> for AnalysisPayload {
    fn from(report: ConvergenceReport) -> Self {
        Self {
            converged: report.converged,
            iterations: report.iterations,
            final_value: report.final_value,
            derivative_at_start: report.derivative_at_start,
            classification: report.classification,
            label: report.classification.label(),
            stop: report.stop,
        }
    }
}

#[wasm_bindgen]
impl WasmEquation {
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str) -> Result<WasmEquation, JsValue> {
        console_error_panic_hook::set_once();

        let equation = Equation::parse(source).map_err(js_error)?;
        Ok(WasmEquation { equation })
    }

    pub fn source(&self) -> String {
        self.equation.source().to_string()
    }

    pub fn evaluate(&self, x: f64) -> Result<f64, JsValue> {
        self.equation.evaluate(x).map_err(js_error)
    }

    pub fn derivative(&self, x: f64, step: Option<f64>) -> Result<f64, JsValue> {
        let settings = DerivativeSettings {
            step: step.unwrap_or(DEFAULT_DERIVATIVE_STEP),
        };
        settings.validate().map_err(js_error)?;
        central_difference(&self.equation, x, settings.step).map_err(js_error)
    }

    /// Display trace for the animation; `settings` may be omitted for the defaults.
    pub fn newton_trace(&self, x0: f64, settings: JsValue) -> Result<JsValue, JsValue> {
        let settings: IterationSettings = settings_from_js(settings)?;
        let trace = self.build_trace(x0, &settings)?;
        to_js(&TracePayload::from(&trace))
    }

    pub fn analyze(&self, x0: f64, settings: JsValue) -> Result<JsValue, JsValue> {
        let settings: AnalysisSettings = settings_from_js(settings)?;
        let report = analyze_initial_point(&self.equation, x0, &settings)
            .map_err(|e| JsValue::from_str(&format!("Analysis failed: {}", e)))?;
        to_js(&AnalysisPayload::from(report))
    }

    pub fn sample_curve(&self, min: f64, max: f64, samples: u32) -> Result<JsValue, JsValue> {
        let axis = CurveAxisSpec {
            min,
            max,
            samples: samples as usize,
        };
        let geometry = sample_curve(&self.equation, &axis).map_err(js_error)?;
        to_js(&geometry)
    }
}

impl WasmEquation {
    pub(crate) fn build_trace(
        &self,
        x0: f64,
        settings: &IterationSettings,
    ) -> Result<NewtonTrace, JsValue> {
        newton_trace(&self.equation, x0, settings)
            .map_err(|e| JsValue::from_str(&format!("Newton iteration failed: {}", e)))
    }

    #[cfg(test)]
    pub(crate) fn equation(&self) -> &Equation {
        &self.equation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newton_core::analysis::analyze;

    #[test]
    fn constructor_compiles_the_equation() {
        let wasm = WasmEquation::new("x^3 - 7").expect("equation");
        assert_eq!(wasm.source(), "x^3 - 7");
        assert_eq!(wasm.equation().evaluate(2.0), Ok(1.0));
        let slope = wasm.derivative(2.0, None).expect("derivative");
        assert!((slope - 12.0).abs() < 1e-3);
    }

    #[test]
    fn build_trace_matches_core_iteration() {
        let wasm = WasmEquation::new("x^3 - 7").expect("equation");
        let trace = wasm
            .build_trace(2.0, &IterationSettings::default())
            .expect("trace");
        let core = newton_core::iterate("x^3 - 7", 2.0, &IterationSettings::default())
            .expect("core trace");
        assert_eq!(trace, core);
    }

    #[test]
    fn trace_payload_explains_diverged_evaluation() {
        let trace = newton_core::iterate("ln(x) + 3", 0.5, &IterationSettings::default())
            .expect("trace");
        let payload = TracePayload::from(&trace);
        assert_eq!(payload.steps.len(), 1);
        let message = payload.message.expect("message");
        assert!(message.contains("ln(-"), "got {message}");
        assert!(message.contains("is undefined"), "got {message}");

        let trace = newton_core::iterate("x^3 - 7", 2.0, &IterationSettings::default())
            .expect("trace");
        assert_eq!(TracePayload::from(&trace).message, None);
    }

    #[test]
    fn analysis_payload_carries_the_label() {
        let report = analyze("x^3 - 7", 2.0, &AnalysisSettings::default()).expect("report");
        let payload = AnalysisPayload::from(report.clone());
        assert_eq!(payload.classification, Classification::DerivativeTooLarge);
        assert_eq!(payload.label, report.classification.label());
        assert_eq!(payload.iterations, report.iterations);
    }
}

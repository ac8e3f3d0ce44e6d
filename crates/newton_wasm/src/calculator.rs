//! Calculator bindings: `Ans` expressions and repeated `=` presses.

use crate::shared::{js_error, to_js};
use newton_core::calculator::{CalculatorSession, DEFAULT_ANS};
use newton_core::equation_engine::{evaluate, Binding};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmCalculator {
    session: CalculatorSession,
}

#[wasm_bindgen]
impl WasmCalculator {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_ans: Option<f64>) -> WasmCalculator {
        console_error_panic_hook::set_once();

        WasmCalculator {
            session: CalculatorSession::new(initial_ans.unwrap_or(DEFAULT_ANS)),
        }
    }

    pub fn ans(&self) -> f64 {
        self.session.ans()
    }

    pub fn last_expression(&self) -> Option<String> {
        self.session.last_expression().map(str::to_string)
    }

    pub fn evaluate(&mut self, expression: &str) -> Result<f64, JsValue> {
        self.session.evaluate(expression).map_err(js_error)
    }

    pub fn repeat(&mut self) -> Result<f64, JsValue> {
        self.session.repeat().map_err(js_error)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn history(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.history())
    }
}

/// One-shot evaluation of an `Ans` expression, without a session.
#[wasm_bindgen]
pub fn evaluate_expression(expression: &str, ans: f64) -> Result<f64, JsValue> {
    evaluate(expression, Binding::ans(ans)).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculator_starts_from_the_default_answer() {
        let calculator = WasmCalculator::new(None);
        assert_eq!(calculator.ans(), DEFAULT_ANS);
        assert_eq!(calculator.last_expression(), None);

        let calculator = WasmCalculator::new(Some(5.0));
        assert_eq!(calculator.ans(), 5.0);
    }

    #[test]
    fn repeat_presses_reuse_the_last_expression() {
        let mut calculator = WasmCalculator::new(None);
        let first = calculator
            .evaluate("Ans - (Ans^3 - 7)/(3*Ans^2)")
            .expect("evaluate");
        let second = calculator.repeat().expect("repeat");
        assert!(second < first);
        assert_eq!(calculator.ans(), second);
        assert_eq!(
            calculator.last_expression().as_deref(),
            Some("Ans - (Ans^3 - 7)/(3*Ans^2)")
        );
    }

    #[test]
    fn one_shot_evaluation_binds_ans() {
        assert_eq!(evaluate_expression("Ans^2 + 1", 3.0).expect("evaluate"), 10.0);
    }
}

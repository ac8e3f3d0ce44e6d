//! Animation replay over a precomputed Newton trace. The JS side owns the timer
//! and calls `tick` every `interval_ms`.

use crate::calculator::WasmCalculator;
use crate::equation::WasmEquation;
use crate::shared::{js_error, settings_from_js, to_js};
use newton_core::calculator::check_answer;
use newton_core::newton::{IterationSettings, NewtonTrace};
use newton_core::playback::{PlaybackSettings, TracePlayer};
use newton_core::plot::tangent_segment;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmTracePlayer {
    player: TracePlayer,
}

#[wasm_bindgen]
impl WasmTracePlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(
        equation: &WasmEquation,
        x0: f64,
        settings: JsValue,
        playback: JsValue,
    ) -> Result<WasmTracePlayer, JsValue> {
        console_error_panic_hook::set_once();

        let settings: IterationSettings = settings_from_js(settings)?;
        let playback: PlaybackSettings = settings_from_js(playback)?;
        let trace = equation.build_trace(x0, &settings)?;
        WasmTracePlayer::from_trace(trace, playback).map_err(js_error)
    }

    /// Index of the highlighted step, or -1 before anything is shown.
    pub fn cursor(&self) -> i32 {
        self.player.cursor().map_or(-1, |idx| idx as i32)
    }

    pub fn len(&self) -> usize {
        self.player.trace().len()
    }

    pub fn is_empty(&self) -> bool {
        self.player.trace().is_empty()
    }

    pub fn is_animating(&self) -> bool {
        self.player.is_animating()
    }

    pub fn interval_ms(&self) -> u32 {
        self.player.interval_ms()
    }

    pub fn start(&mut self) {
        self.player.start();
    }

    pub fn resume(&mut self) {
        self.player.resume();
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn tick(&mut self) -> bool {
        self.player.tick()
    }

    pub fn next(&mut self) -> bool {
        self.player.next()
    }

    pub fn prev(&mut self) -> bool {
        self.player.prev()
    }

    pub fn reset(&mut self) {
        self.player.reset();
    }

    pub fn visible_steps(&self) -> Result<JsValue, JsValue> {
        to_js(&self.player.visible_steps())
    }

    /// Tangent endpoints at the highlighted step, or `null` when there is none to draw.
    pub fn current_tangent(&self, half_width: f64) -> Result<JsValue, JsValue> {
        let segment = self
            .player
            .current_step()
            .and_then(|step| tangent_segment(step, half_width));
        to_js(&segment)
    }

    /// Whether the calculator's current answer has reached the root of this trace.
    pub fn check_calculator(&self, calculator: &WasmCalculator) -> bool {
        self.check_answer(calculator.ans())
    }

    pub fn check_answer(&self, value: f64) -> bool {
        check_answer(value, self.player.trace())
    }
}

impl WasmTracePlayer {
    pub(crate) fn from_trace(
        trace: NewtonTrace,
        playback: PlaybackSettings,
    ) -> anyhow::Result<WasmTracePlayer> {
        Ok(WasmTracePlayer {
            player: TracePlayer::new(trace, playback)?,
        })
    }
}

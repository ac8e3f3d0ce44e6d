//! WASM bridge for `newton_core`.
//!
//! Results cross the boundary as plain JS objects via `serde-wasm-bindgen`;
//! errors cross as string `JsValue`s. Panics are routed to the browser console.

mod calculator;
mod equation;
mod playback;
mod shared;

pub use calculator::{evaluate_expression, WasmCalculator};
pub use equation::WasmEquation;
pub use playback::WasmTracePlayer;

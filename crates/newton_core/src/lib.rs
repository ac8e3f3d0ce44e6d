pub mod analysis;
pub mod calculator;
pub mod derivative;
pub mod equation_engine;
pub mod errors;
pub mod newton;
pub mod playback;
pub mod plot;
/// The `newton_core` crate is the numerical engine behind the Newton calculator.
/// Everything here is pure and synchronous: no I/O, no shared state.
///
/// Key components:
/// - **Equation Engine**: a recursive-descent parser and bytecode VM for `x`/`Ans` expressions.
/// - **Derivative**: central-difference slopes over any `ScalarFunction`.
/// - **Newton**: the bounded display trace; **Analysis**: the convergence verdict.
/// - **Calculator**, **Playback**, **Plot**: driver-side state and geometry built on the above.
pub mod traits;

pub use analysis::{analyze, AnalysisSettings, Classification, ConvergenceReport};
pub use derivative::{derivative, DerivativeSettings};
pub use equation_engine::{evaluate, Binding, Equation, Placeholder};
pub use errors::{DomainError, EvalError, SolverError, SyntaxError};
pub use newton::{iterate, IterationSettings, NewtonStep, NewtonTrace, Termination};

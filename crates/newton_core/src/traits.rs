use crate::errors::EvalError;

/// A real-valued function of one real variable that may fail to evaluate.
///
/// Implementations must be pure: the same `x` always yields the same result.
pub trait ScalarFunction {
    /// Evaluates f(x). Returns a finite value or a tagged error, never NaN/Infinity.
    fn eval(&self, x: f64) -> Result<f64, EvalError>;
}

impl<F: ScalarFunction + ?Sized> ScalarFunction for &F {
    fn eval(&self, x: f64) -> Result<f64, EvalError> {
        (**self).eval(x)
    }
}

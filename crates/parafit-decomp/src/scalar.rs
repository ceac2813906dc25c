//! Element types a model can be fitted in

use scirs2_core::ndarray_ext::ScalarOperand;
use scirs2_core::numeric::{Float, FloatConst, NumAssign, NumCast};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Floating-point element type accepted by the fitting routines
///
/// Implemented for every type with the numeric and threading bounds the ALS
/// kernels and `scirs2_linalg` decompositions need; in practice `f32` and `f64`.
pub trait FitScalar:
    Float
    + FloatConst
    + NumAssign
    + NumCast
    + Sum
    + ScalarOperand
    + Send
    + Sync
    + Debug
    + Display
    + 'static
{
    /// Lossy conversion used for traces and checkpoints
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Conversion from `f64`; `None` if the value is not representable
    fn from_f64_checked(value: f64) -> Option<Self> {
        <Self as NumCast>::from(value)
    }
}

impl<T> FitScalar for T where
    T: Float
        + FloatConst
        + NumAssign
        + NumCast
        + Sum
        + ScalarOperand
        + Send
        + Sync
        + Debug
        + Display
        + 'static
{
}

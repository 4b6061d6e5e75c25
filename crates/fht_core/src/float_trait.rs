//! Float trait abstraction for f32/f64 support.
//!
//! The transform engine is written once against [`FhtFloat`]. `f32` is the
//! canonical pixel type; `f64` is available for reference computations.

use num_traits::{Float, FromPrimitive, NumAssign};
use rustfft::FftNum;
use std::fmt::Debug;
use std::iter::Sum;

/// Trait alias for floating point types supported by the Hartley engine.
///
/// This trait combines all the bounds needed by the transform and filters:
/// - Basic float operations (Float, NumAssign)
/// - Complex spectrum output (FftNum from rustfft)
/// - Conversion from primitive types (FromPrimitive)
/// - Iteration support (Sum)
/// - Debug printing
pub trait FhtFloat:
    Float + FftNum + FromPrimitive + NumAssign + Sum + Debug + Send + Sync + 'static
{
    /// Smallest squared magnitude used as a divisor in spectral division.
    const DIVIDE_FLOOR: Self;

    /// Create a value from an f64 constant.
    fn from_f64_c(val: f64) -> Self;

    /// Create a value from a usize constant.
    fn usize_as(val: usize) -> Self;

    /// Widen to f64 for statistics and display mapping.
    fn as_f64(self) -> f64;
}

impl FhtFloat for f32 {
    const DIVIDE_FLOOR: Self = 1e-20;

    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl FhtFloat for f64 {
    const DIVIDE_FLOOR: Self = 1e-20;

    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f64
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

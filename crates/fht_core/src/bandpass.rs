//! Gaussian band-pass filtering in the Hartley domain.
//!
//! Large structures are suppressed with `1 - gL(u) gL(v)` and small
//! structures with `gS(u) gS(v)`, where `g(k) = exp(-k^2 s^2)` and `k` is the
//! absolute frequency index along each axis. Optional stripe suppression adds
//! a `1 - gT(k)` term along one axis. Every position with the same absolute
//! frequencies gets the same factor, so the mask is symmetric under
//! `k -> -k` and a real image stays real after filtering.

use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};

use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::quadrants::swap_quadrants;
use crate::transforms::square_side;

// =============================================================================
// Constants
// =============================================================================

/// Default large-structure cutoff in pixels.
const DEFAULT_FILTER_LARGE: f64 = 40.0;

/// Default small-structure cutoff in pixels.
const DEFAULT_FILTER_SMALL: f64 = 3.0;

/// Default stripe tolerance in percent.
const DEFAULT_TOLERANCE: f64 = 5.0;

/// Largest byte value of a custom mask; maps to a factor of exactly 1.
const CUSTOM_MASK_FULL: f64 = 255.0;

// =============================================================================
// Types
// =============================================================================

/// Direction of stripes to suppress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripeAxis {
    /// No stripe suppression.
    #[default]
    None,
    /// Remove horizontal stripes (energy along the vertical frequency axis).
    Horizontal,
    /// Remove vertical stripes (energy along the horizontal frequency axis).
    Vertical,
}

/// User-facing band-pass settings in image pixels.
#[derive(Debug, Clone)]
pub struct BandpassConfig<F: FhtFloat> {
    /// Structures larger than this many pixels are suppressed. `<= 0` disables. Default: 40
    pub filter_large: F,
    /// Structures smaller than this many pixels are suppressed. `0` disables. Default: 3
    pub filter_small: F,
    /// Stripe direction to suppress. Default: none
    pub stripes: StripeAxis,
    /// Stripe tolerance in percent, 0..=100. Default: 5
    pub tolerance: F,
    /// Compute a display range for the result. Default: true
    pub autoscale: bool,
    /// Saturate 1% of pixels when computing the display range. Default: true
    pub saturate: bool,
    /// Return the centred filter mask alongside the result. Default: false
    pub display_filter: bool,
}

impl<F: FhtFloat> Default for BandpassConfig<F> {
    fn default() -> Self {
        Self {
            filter_large: F::from_f64_c(DEFAULT_FILTER_LARGE),
            filter_small: F::from_f64_c(DEFAULT_FILTER_SMALL),
            stripes: StripeAxis::None,
            tolerance: F::from_f64_c(DEFAULT_TOLERANCE),
            autoscale: true,
            saturate: true,
            display_filter: false,
        }
    }
}

impl<F: FhtFloat> BandpassConfig<F> {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), FhtError> {
        if !self.filter_large.is_finite() {
            return Err(FhtError::InvalidConfig(
                "filter_large must be finite".to_string(),
            ));
        }
        if !self.filter_small.is_finite() || self.filter_small < F::zero() {
            return Err(FhtError::InvalidConfig(
                "filter_small must be finite and >= 0".to_string(),
            ));
        }
        let hundred = F::from_f64_c(100.0);
        if !(self.tolerance >= F::zero() && self.tolerance <= hundred) {
            return Err(FhtError::InvalidConfig(
                "tolerance must be within 0..=100".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert pixel sizes into fractions of a `padded_size` canvas.
    pub fn params_for(&self, padded_size: usize) -> BandpassParams<F> {
        let size = F::usize_as(padded_size);
        let two = F::from_f64_c(2.0);
        let hundred = F::from_f64_c(100.0);
        BandpassParams {
            filter_large: two * self.filter_large / size,
            filter_small: two * self.filter_small / size,
            stripes: self.stripes,
            stripe_scale: (hundred - self.tolerance) / hundred,
        }
    }

    /// Saturation percentage for the display range, or `None` when
    /// autoscaling is off.
    pub fn saturation(&self) -> Option<f64> {
        match (self.autoscale, self.saturate) {
            (false, _) => None,
            (true, true) => Some(1.0),
            (true, false) => Some(0.0),
        }
    }
}

/// Band-pass parameters relative to one canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandpassParams<F: FhtFloat> {
    /// Large-structure scale, `2 * px / P`. `<= 0` disables suppression.
    pub filter_large: F,
    /// Small-structure scale, `2 * px / P`.
    pub filter_small: F,
    pub stripes: StripeAxis,
    /// `(100 - tolerance) / 100`.
    pub stripe_scale: F,
}

// =============================================================================
// Mask construction
// =============================================================================

/// `exp(-k^2 s^2)` for `k = 0..=half`.
fn gaussian_profile(half: usize, scale: f64) -> Vec<f64> {
    let s2 = scale * scale;
    (0..=half)
        .map(|k| {
            let k = k as f64;
            (-(k * k) * s2).exp()
        })
        .collect()
}

/// Large-structure profile; all zeros when suppression is disabled so that
/// `1 - gL gL` is exactly 1.
fn large_profile(half: usize, filter_large: f64) -> Vec<f64> {
    if filter_large > 0.0 {
        gaussian_profile(half, filter_large)
    } else {
        vec![0.0; half + 1]
    }
}

/// Attenuation factors for a `size` x `size` coefficient buffer, DC at `[0, 0]`.
///
/// The DC factor is always exactly 1.
pub fn bandpass_mask<F: FhtFloat>(params: &BandpassParams<F>, size: usize) -> Result<Array2<F>, FhtError> {
    square_side((size, size))?;
    let half = size / 2;
    let large = large_profile(half, params.filter_large.as_f64());
    let small = gaussian_profile(half, params.filter_small.as_f64());
    let stripe = gaussian_profile(half, params.stripe_scale.as_f64());

    // Factors depend only on |u| and |v|; build one quadrant and mirror it.
    let mut quadrant = Array2::<f64>::zeros((half + 1, half + 1));
    for ((u, v), factor) in quadrant.indexed_iter_mut() {
        let mut f = (1.0 - large[u] * large[v]) * small[u] * small[v];
        match params.stripes {
            StripeAxis::None => {}
            StripeAxis::Horizontal => f *= 1.0 - stripe[v],
            StripeAxis::Vertical => f *= 1.0 - stripe[u],
        }
        *factor = f;
    }
    quadrant[[0, 0]] = 1.0;

    let fold = |k: usize| if k <= half { k } else { size - k };
    Ok(Array2::from_shape_fn((size, size), |(r, c)| {
        F::from_f64_c(quadrant[[fold(r), fold(c)]])
    }))
}

/// Multiply coefficients by a DC-corner mask in place.
pub fn apply_mask<F: FhtFloat>(mut fht: ArrayViewMut2<F>, mask: ArrayView2<F>) -> Result<(), FhtError> {
    if fht.dim() != mask.dim() {
        return Err(FhtError::DimensionMismatch {
            expected: fht.dim(),
            actual: mask.dim(),
        });
    }
    Zip::from(&mut fht).and(&mask).for_each(|h, &m| *h *= m);
    Ok(())
}

/// Band-pass filter a coefficient buffer in place.
///
/// With `visualize` set, the mask is also returned in centred layout for
/// display.
pub fn filter_large_small<F: FhtFloat>(
    mut fht: ArrayViewMut2<F>,
    params: &BandpassParams<F>,
    visualize: bool,
) -> Result<Option<Array2<F>>, FhtError> {
    let size = square_side(fht.dim())?;
    let mut mask = bandpass_mask(params, size)?;
    apply_mask(fht.view_mut(), mask.view())?;
    if !visualize {
        return Ok(None);
    }
    swap_quadrants(mask.view_mut())?;
    Ok(Some(mask))
}

/// Multiply coefficients by a centred 8-bit mask scaled to `[0, 1]`.
///
/// The mask uses the display layout (DC at the centre) and is swapped to the
/// coefficient layout first. A zero byte clears the coefficient exactly.
pub fn apply_custom_mask<F: FhtFloat>(mut fht: ArrayViewMut2<F>, mask: ArrayView2<u8>) -> Result<(), FhtError> {
    square_side(fht.dim())?;
    if mask.dim() != fht.dim() {
        return Err(FhtError::DimensionMismatch {
            expected: fht.dim(),
            actual: mask.dim(),
        });
    }
    let mut corner = mask.to_owned();
    swap_quadrants(corner.view_mut())?;

    let full = F::from_f64_c(CUSTOM_MASK_FULL);
    Zip::from(&mut fht).and(&corner).for_each(|h, &m| {
        if m == 0 {
            *h = F::zero();
        } else {
            *h *= F::from_f64_c(f64::from(m)) / full;
        }
    });
    Ok(())
}

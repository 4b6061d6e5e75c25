//! Power spectrum, amplitude and the 8-bit display mapping.
//!
//! Everything here is display-only: the byte image is a lossy, log-scaled
//! view of the coefficients and is never fed back into an inverse transform.

use ndarray::{Array2, ArrayView2};

use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::quadrants::swap_quadrants;
use crate::transforms::{mirror, square_side};

/// Lowest byte written by the display mapping.
const DISPLAY_LOW: u8 = 1;

/// Width of the display range, `254 - 1`.
const DISPLAY_SPAN: f64 = 253.0;

/// Power per coefficient: `(H(k)^2 + H(-k)^2) / 2`, DC at `[0, 0]`.
pub fn power_spectrum<F: FhtFloat>(fht: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    let n = square_side(fht.dim())?;
    let two = F::from_f64_c(2.0);
    Ok(Array2::from_shape_fn((n, n), |(r, c)| {
        let a = fht[[r, c]];
        let b = fht[[mirror(r, n), mirror(c, n)]];
        (a * a + b * b) / two
    }))
}

/// Amplitude per coefficient: `sqrt(H(k)^2 + H(-k)^2)`, DC at `[0, 0]`.
pub fn amplitude<F: FhtFloat>(fht: ArrayView2<F>) -> Result<Array2<F>, FhtError> {
    let n = square_side(fht.dim())?;
    Ok(Array2::from_shape_fn((n, n), |(r, c)| {
        let a = fht[[r, c]];
        let b = fht[[mirror(r, n), mirror(c, n)]];
        (a * a + b * b).sqrt()
    }))
}

/// Log value used for display; powers below 1 map to 0.
#[inline]
fn display_log(power: f64) -> f64 {
    if power < 1.0 {
        0.0
    } else {
        power.ln()
    }
}

/// Log-scaled 8-bit power spectrum with DC moved to the centre.
///
/// Log powers are stretched linearly onto `[1, 254]`. A spectrum whose log
/// values are all equal maps to 1 everywhere.
pub fn power_spectrum_image<F: FhtFloat>(fht: ArrayView2<F>) -> Result<Array2<u8>, FhtError> {
    let power = power_spectrum(fht)?;
    let logged = power.mapv(|p| display_log(p.as_f64()));

    let (min, max) = logged
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let mut image = if max > min {
        let scale = DISPLAY_SPAN / (max - min);
        logged.mapv(|v| ((v - min) * scale + 0.5) as u8 + DISPLAY_LOW)
    } else {
        tracing::warn!("power spectrum has no dynamic range; display is flat");
        Array2::from_elem(logged.dim(), DISPLAY_LOW)
    };

    swap_quadrants(image.view_mut())?;
    Ok(image)
}

//! Frequency-domain filtering pipeline
//!
//! Ties padding, transforms and filters together into the user-level
//! operations:
//! - band-pass filtering of an image (`filter_image`)
//! - filtering with a hand-edited spectrum mask (`custom_filter_image`)
//! - forward power spectrum and inverse reconstruction (`forward_spectrum`,
//!   `inverse_spectrum`)
//! - correlation, convolution and deconvolution of two images (`fd_math`)
//!
//! Inputs are only read. Each call allocates its own canvas and returns a
//! fresh result, so a failed or cancelled call leaves nothing half-written.

use std::time::Instant;

use ndarray::{Array2, ArrayView2};

use crate::bandpass::{apply_custom_mask, filter_large_small, BandpassConfig, BandpassParams};
use crate::contrast::{stretch_bounds, DisplayRange};
use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::padding::{crop, tile_mirrored, Placement};
use crate::progress::{checkpoint, Phase, ProgressSink};
use crate::quadrants::swap_quadrants;
use crate::spectrum::power_spectrum_image;
use crate::tables::FhtPlan;
use crate::transforms::{conjugate_multiply, divide, fht2d, multiply, square_side};

// =============================================================================
// Constants
// =============================================================================

const PROFILE_TIMING_ENV: &str = "FHT_PROFILE_TIMING";

// =============================================================================
// Types
// =============================================================================

/// Result of a band-pass round trip.
#[derive(Debug, Clone)]
pub struct FilteredImage<F: FhtFloat> {
    /// Filtered image, same shape as the input.
    pub image: Array2<F>,
    /// Suggested display bounds when autoscaling is enabled.
    pub display_range: Option<DisplayRange<F>>,
    /// Centred filter mask when `display_filter` is set.
    pub filter: Option<Array2<F>>,
}

/// Forward transform of a padded image with its display spectrum.
#[derive(Debug, Clone)]
pub struct Spectrum<F: FhtFloat> {
    /// Raw Hartley coefficients of the padded canvas, DC at `[0, 0]`.
    pub fht: Array2<F>,
    /// Log-scaled power spectrum, DC centred.
    pub power: Array2<u8>,
    /// Where the original region sits in the canvas.
    pub placement: Placement,
}

/// Two-image frequency-domain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdOperation {
    /// `sum a(n + m) b(n)`; peaks at the shift that best aligns the images.
    Correlate,
    /// Circular convolution `a * b`.
    Convolve,
    /// Inverse of `Convolve`: recovers `a` from `a * b` and `b`.
    Deconvolve,
}

/// What to do to the coefficients between the transforms.
pub(crate) enum SpectralFilter<'a, F: FhtFloat> {
    Bandpass {
        params: BandpassParams<F>,
        visualize: bool,
    },
    Custom(ArrayView2<'a, u8>),
}

// =============================================================================
// Profiling
// =============================================================================

pub(crate) fn resolve_profile_timing() -> bool {
    std::env::var(PROFILE_TIMING_ENV)
        .ok()
        .map(|value| {
            let v = value.trim();
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PhaseTimings {
    pad_ns: u128,
    forward_ns: u128,
    filter_ns: u128,
    inverse_ns: u128,
    crop_ns: u128,
}

impl PhaseTimings {
    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            pad_ns: self.pad_ns + other.pad_ns,
            forward_ns: self.forward_ns + other.forward_ns,
            filter_ns: self.filter_ns + other.filter_ns,
            inverse_ns: self.inverse_ns + other.inverse_ns,
            crop_ns: self.crop_ns + other.crop_ns,
        }
    }

    pub(crate) fn log(&self, label: &str, rows: usize, cols: usize, size: usize, wall_ns: u128) {
        let ms = |ns: u128| ns as f64 / 1_000_000.0;
        tracing::debug!(
            target: "fht_profile",
            label,
            rows,
            cols,
            size,
            wall_ms = ms(wall_ns),
            pad_ms = ms(self.pad_ns),
            forward_ms = ms(self.forward_ns),
            filter_ms = ms(self.filter_ns),
            inverse_ms = ms(self.inverse_ns),
            crop_ms = ms(self.crop_ns),
            "phase timings"
        );
    }
}

macro_rules! timed {
    ($enabled:expr, $acc:expr, $body:block) => {{
        if $enabled {
            let _t = Instant::now();
            let _ret = { $body };
            $acc += _t.elapsed().as_nanos();
            _ret
        } else {
            $body
        }
    }};
}

// =============================================================================
// Round trip
// =============================================================================

/// Pad, transform, filter, invert and crop one image with a prepared plan.
///
/// The plan must match the padded size of `input`. Returns the cropped
/// result and, for a visualized band-pass, the centred mask.
pub(crate) fn round_trip<F: FhtFloat, P: ProgressSink + ?Sized>(
    input: ArrayView2<F>,
    plan: &FhtPlan<F>,
    filter: &SpectralFilter<F>,
    progress: &P,
    profile: bool,
    timings: &mut PhaseTimings,
) -> Result<(Array2<F>, Option<Array2<F>>), FhtError> {
    let (mut canvas, placement) = timed!(profile, timings.pad_ns, { tile_mirrored(input)? });
    checkpoint(progress, Phase::Pad)?;

    timed!(profile, timings.forward_ns, {
        fht2d(canvas.view_mut(), false, plan)?
    });
    checkpoint(progress, Phase::Forward)?;

    let visualization = timed!(profile, timings.filter_ns, {
        match filter {
            SpectralFilter::Bandpass { params, visualize } => {
                filter_large_small(canvas.view_mut(), params, *visualize)?
            }
            SpectralFilter::Custom(mask) => {
                apply_custom_mask(canvas.view_mut(), *mask)?;
                None
            }
        }
    });
    checkpoint(progress, Phase::Filter)?;

    timed!(profile, timings.inverse_ns, {
        fht2d(canvas.view_mut(), true, plan)?
    });
    checkpoint(progress, Phase::Inverse)?;

    let output = timed!(profile, timings.crop_ns, { crop(canvas.view(), &placement)? });
    checkpoint(progress, Phase::Crop)?;

    Ok((output, visualization))
}

/// Placement and plan for an input region.
fn prepare<F: FhtFloat>(input: &ArrayView2<F>) -> Result<(Placement, FhtPlan<F>), FhtError> {
    let (rows, cols) = input.dim();
    let placement = Placement::for_region(cols, rows)?;
    let plan = FhtPlan::new(placement.size)?;
    Ok((placement, plan))
}

// =============================================================================
// Public API
// =============================================================================

/// Band-pass filter an image.
///
/// The image is mirror-padded to a power-of-two canvas, filtered in the
/// Hartley domain and cropped back. Progress is reported after each phase
/// and a cancelled call returns [`FhtError::Cancelled`].
pub fn filter_image<F: FhtFloat, P: ProgressSink + ?Sized>(
    input: ArrayView2<F>,
    config: &BandpassConfig<F>,
    progress: &P,
) -> Result<FilteredImage<F>, FhtError> {
    config.validate()?;
    let (placement, plan) = prepare(&input)?;
    let params = config.params_for(placement.size);
    tracing::debug!(
        width = placement.width,
        height = placement.height,
        size = placement.size,
        stripes = ?params.stripes,
        "band-pass filtering"
    );

    let profile = resolve_profile_timing();
    let started = profile.then(Instant::now);
    let mut timings = PhaseTimings::default();

    let filter = SpectralFilter::Bandpass {
        params,
        visualize: config.display_filter,
    };
    let (image, filter) = round_trip(input, &plan, &filter, progress, profile, &mut timings)?;

    if let Some(t) = started {
        timings.log(
            "filter_image",
            placement.height,
            placement.width,
            placement.size,
            t.elapsed().as_nanos(),
        );
    }

    let display_range = config
        .saturation()
        .and_then(|saturated| stretch_bounds(image.view(), saturated));

    Ok(FilteredImage {
        image,
        display_range,
        filter,
    })
}

/// Filter an image with a centred 8-bit spectrum mask.
///
/// The mask must match the padded canvas, i.e. the shape of the power
/// spectrum returned by [`forward_spectrum`] for the same input.
pub fn custom_filter_image<F: FhtFloat, P: ProgressSink + ?Sized>(
    input: ArrayView2<F>,
    mask: ArrayView2<u8>,
    progress: &P,
) -> Result<Array2<F>, FhtError> {
    let (placement, plan) = prepare(&input)?;
    let expected = (placement.size, placement.size);
    if mask.dim() != expected {
        return Err(FhtError::DimensionMismatch {
            expected,
            actual: mask.dim(),
        });
    }

    let profile = resolve_profile_timing();
    let started = profile.then(Instant::now);
    let mut timings = PhaseTimings::default();

    let filter = SpectralFilter::Custom(mask);
    let (image, _) = round_trip(input, &plan, &filter, progress, profile, &mut timings)?;

    if let Some(t) = started {
        timings.log(
            "custom_filter_image",
            placement.height,
            placement.width,
            placement.size,
            t.elapsed().as_nanos(),
        );
    }
    Ok(image)
}

/// Mirror-pad and transform an image, returning coefficients and the
/// display spectrum.
pub fn forward_spectrum<F: FhtFloat>(input: ArrayView2<F>) -> Result<Spectrum<F>, FhtError> {
    let (placement, plan) = prepare(&input)?;
    let (mut fht, _) = tile_mirrored(input)?;
    fht2d(fht.view_mut(), false, &plan)?;
    let power = power_spectrum_image(fht.view())?;
    Ok(Spectrum {
        fht,
        power,
        placement,
    })
}

/// Inverse transform a spectrum and crop back to the original region.
pub fn inverse_spectrum<F: FhtFloat>(spectrum: &Spectrum<F>) -> Result<Array2<F>, FhtError> {
    let plan = FhtPlan::new(spectrum.placement.size)?;
    let mut canvas = spectrum.fht.clone();
    fht2d(canvas.view_mut(), true, &plan)?;
    crop(canvas.view(), &spectrum.placement)
}

/// Correlate, convolve or deconvolve two square power-of-two images.
///
/// The result is quadrant-swapped so that zero shift sits at the centre.
pub fn fd_math<F: FhtFloat>(
    a: ArrayView2<F>,
    b: ArrayView2<F>,
    op: FdOperation,
) -> Result<Array2<F>, FhtError> {
    let n = square_side(a.dim())?;
    if b.dim() != a.dim() {
        return Err(FhtError::DimensionMismatch {
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    let plan = FhtPlan::new(n)?;

    let mut h1 = a.to_owned();
    let mut h2 = b.to_owned();
    fht2d(h1.view_mut(), false, &plan)?;
    fht2d(h2.view_mut(), false, &plan)?;

    let mut result = match op {
        FdOperation::Correlate => conjugate_multiply(h1.view(), h2.view())?,
        FdOperation::Convolve => multiply(h1.view(), h2.view())?,
        FdOperation::Deconvolve => divide(h1.view(), h2.view())?,
    };
    fht2d(result.view_mut(), true, &plan)?;
    swap_quadrants(result.view_mut())?;
    Ok(result)
}

//! Display range selection by histogram tail saturation.
//!
//! Only the display bounds are computed; pixel values are never modified.

use ndarray::ArrayView2;

use crate::float_trait::FhtFloat;

const HISTOGRAM_BINS: usize = 256;

/// Intensity bounds for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange<F: FhtFloat> {
    pub min: F,
    pub max: F,
}

/// Bounds that saturate `saturated` percent of the pixels, split between the
/// two tails of a 256-bin histogram.
///
/// Non-finite values are ignored. Returns `None` for an image with no finite
/// pixels; a constant image gets its single value as both bounds.
pub fn stretch_bounds<F: FhtFloat>(values: ArrayView2<F>, saturated: f64) -> Option<DisplayRange<F>> {
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(F, F)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    let full = DisplayRange { min: lo, max: hi };
    if hi <= lo {
        tracing::warn!("flat image; display range collapses to a single value");
        return Some(full);
    }

    let bin_size = (hi - lo) / F::usize_as(HISTOGRAM_BINS);
    let last = HISTOGRAM_BINS - 1;
    let mut histogram = [0usize; HISTOGRAM_BINS];
    let mut count = 0usize;
    for v in values.iter().copied().filter(|v| v.is_finite()) {
        let bin = ((v - lo) / bin_size).as_f64() as usize;
        histogram[bin.min(last)] += 1;
        count += 1;
    }

    let threshold = if saturated > 0.0 {
        (count as f64 * saturated / 200.0) as usize
    } else {
        0
    };

    let mut cumulative = 0;
    let mut low_bin = last;
    for (i, &n) in histogram.iter().enumerate() {
        cumulative += n;
        if cumulative > threshold {
            low_bin = i;
            break;
        }
    }

    cumulative = 0;
    let mut high_bin = 0;
    for (i, &n) in histogram.iter().enumerate().rev() {
        cumulative += n;
        if cumulative > threshold {
            high_bin = i;
            break;
        }
    }

    if high_bin < low_bin {
        tracing::warn!(saturated, "saturation exceeds histogram; using full range");
        return Some(full);
    }

    let min = lo + F::usize_as(low_bin) * bin_size;
    let max = lo + F::usize_as(high_bin) * bin_size;
    if min == max {
        return Some(full);
    }
    Some(DisplayRange { min, max })
}

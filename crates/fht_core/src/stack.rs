//! Band-pass filtering of image stacks, one slice per rayon task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use ndarray::{s, Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;

use crate::bandpass::BandpassConfig;
use crate::contrast::{stretch_bounds, DisplayRange};
use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::orchestration::{resolve_profile_timing, round_trip, PhaseTimings, SpectralFilter};
use crate::padding::Placement;
use crate::progress::{Phase, ProgressSink};
use crate::tables::FhtPlanner;

/// Result of filtering every slice of a stack.
#[derive(Debug, Clone)]
pub struct FilteredStack<F: FhtFloat> {
    /// Filtered slices, same shape as the input stack.
    pub slices: Array3<F>,
    /// Display bounds computed on the first slice when autoscaling is enabled.
    pub display_range: Option<DisplayRange<F>>,
    /// Centred filter mask, recorded once since every slice shares it.
    pub filter: Option<Array2<F>>,
}

/// Forwards cancellation from the stack-level sink but keeps per-phase
/// reports of a single slice to itself.
struct SliceProgress<'a, P: ProgressSink + ?Sized> {
    inner: &'a P,
}

impl<P: ProgressSink + ?Sized> ProgressSink for SliceProgress<'_, P> {
    fn report(&self, _phase: Phase, _fraction: f64) {}

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// Band-pass filter every slice of `stack` (`[slice, row, col]`).
///
/// Slices are processed in parallel with one shared transform plan. After
/// each slice finishes, `progress` receives [`Phase::Crop`] with the fraction
/// of slices done. Cancellation aborts the whole stack and nothing is
/// returned.
pub fn filter_stack<F: FhtFloat, P: ProgressSink + ?Sized>(
    stack: ArrayView3<F>,
    config: &BandpassConfig<F>,
    progress: &P,
) -> Result<FilteredStack<F>, FhtError> {
    config.validate()?;
    let (n, rows, cols) = stack.dim();
    if n == 0 {
        return Err(FhtError::EmptyRegion {
            width: cols,
            height: rows,
        });
    }
    let placement = Placement::for_region(cols, rows)?;
    let mut planner = FhtPlanner::new();
    let plan = planner.plan(placement.size)?;
    let params = config.params_for(placement.size);

    let profile = resolve_profile_timing();
    let started = profile.then(Instant::now);
    let done = AtomicUsize::new(0);
    let slice_progress = SliceProgress { inner: progress };

    let results: Vec<(Array2<F>, Option<Array2<F>>, PhaseTimings)> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<_, FhtError> {
            let filter = SpectralFilter::Bandpass {
                params,
                visualize: config.display_filter && i == 0,
            };
            let mut timings = PhaseTimings::default();
            let (image, vis) = round_trip(
                stack.index_axis(Axis(0), i),
                &plan,
                &filter,
                &slice_progress,
                profile,
                &mut timings,
            )?;
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            progress.report(Phase::Crop, finished as f64 / n as f64);
            Ok((image, vis, timings))
        })
        .collect::<Result<_, _>>()?;

    let mut slices = Array3::<F>::zeros((n, rows, cols));
    let mut filter = None;
    let mut timings = PhaseTimings::default();
    for (i, (image, vis, t)) in results.into_iter().enumerate() {
        slices.slice_mut(s![i, .., ..]).assign(&image);
        if vis.is_some() {
            filter = vis;
        }
        timings = timings.merge(t);
    }

    if let Some(t) = started {
        timings.log("filter_stack", rows, cols, placement.size, t.elapsed().as_nanos());
    }
    tracing::info!(slices = n, rows, cols, size = placement.size, "filtered stack");

    let display_range = config
        .saturation()
        .and_then(|saturated| stretch_bounds(slices.index_axis(Axis(0), 0), saturated));

    Ok(FilteredStack {
        slices,
        display_range,
        filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::filter_image;
    use crate::progress::{NoProgress, ProgressHandle};

    fn ramp_stack(n: usize, rows: usize, cols: usize) -> Array3<f64> {
        Array3::from_shape_fn((n, rows, cols), |(k, r, c)| {
            ((k * 37 + r * 11 + c * 5) % 23) as f64 * 10.0
        })
    }

    #[test]
    fn test_stack_matches_per_slice_filtering() {
        let stack = ramp_stack(4, 20, 30);
        let config = BandpassConfig::<f64>::default();
        let result = filter_stack(stack.view(), &config, &NoProgress).unwrap();
        assert_eq!(result.slices.dim(), (4, 20, 30));
        for i in 0..4 {
            let slice = stack.index_axis(Axis(0), i);
            let single = filter_image(slice, &config, &NoProgress).unwrap();
            assert_eq!(result.slices.index_axis(Axis(0), i), single.image);
        }
        assert!(result.display_range.is_some());
    }

    #[test]
    fn test_stack_filter_visualization_from_first_slice() {
        let stack = ramp_stack(3, 8, 8);
        let config = BandpassConfig::<f64> {
            display_filter: true,
            ..BandpassConfig::default()
        };
        let result = filter_stack(stack.view(), &config, &NoProgress).unwrap();
        let filter = result.filter.unwrap();
        assert_eq!(filter.dim(), (16, 16));
        assert_eq!(filter[[8, 8]], 1.0);
    }

    #[test]
    fn test_stack_progress_reaches_one() {
        let stack = ramp_stack(5, 6, 6);
        let (handle, rx) = ProgressHandle::with_channel();
        filter_stack(stack.view(), &BandpassConfig::default(), &handle).unwrap();
        let fractions: Vec<f64> = rx.try_iter().map(|u| u.fraction).collect();
        assert_eq!(fractions.len(), 5);
        assert!(fractions.contains(&1.0));
    }

    #[test]
    fn test_cancelled_stack_returns_error() {
        let stack = ramp_stack(3, 6, 6);
        let handle = ProgressHandle::new();
        handle.cancel();
        assert!(matches!(
            filter_stack(stack.view(), &BandpassConfig::default(), &handle),
            Err(FhtError::Cancelled { .. })
        ));
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        let stack = Array3::<f64>::zeros((0, 4, 4));
        assert!(filter_stack(stack.view(), &BandpassConfig::default(), &NoProgress).is_err());
    }
}

//! Precomputed tables for the Hartley butterfly network.
//!
//! A [`FhtPlan`] bundles the quarter-period cosine/sine tables and the
//! bit-reversal permutation for one transform size. Plans are immutable and
//! can be shared across threads; [`FhtPlanner`] caches them by size for
//! callers that transform many buffers of the same side.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::FhtError;
use crate::float_trait::FhtFloat;

/// Smallest transform size: the first two stages form one radix-4 butterfly.
pub const MIN_TRANSFORM_SIZE: usize = 4;

/// Base-2 logarithm of a power of two, found from its highest set bit.
///
/// # Panics
/// Panics if `n` is not a power of two.
pub fn log2_exact(n: usize) -> u32 {
    assert!(n.is_power_of_two(), "{} is not a power of two", n);
    usize::BITS - 1 - n.leading_zeros()
}

/// Cosine and sine of `i * 2π / n` for `i` in `0..n/4`.
///
/// # Panics
/// Panics if `n` is not a power of two or is smaller than 4.
pub fn trig_tables<F: FhtFloat>(n: usize) -> (Vec<F>, Vec<F>) {
    assert!(
        n.is_power_of_two() && n >= MIN_TRANSFORM_SIZE,
        "trig tables need a power of two >= {}, got {}",
        MIN_TRANSFORM_SIZE,
        n
    );
    let quarter = n / 4;
    let d_theta = 2.0 * std::f64::consts::PI / n as f64;
    let cos = (0..quarter)
        .map(|i| F::from_f64_c((i as f64 * d_theta).cos()))
        .collect();
    let sin = (0..quarter)
        .map(|i| F::from_f64_c((i as f64 * d_theta).sin()))
        .collect();
    (cos, sin)
}

/// Bit-reversal permutation over `log2(n)` bits.
///
/// For `n = 8`, index 1 (`001`) maps to 4 (`100`).
///
/// # Panics
/// Panics if `n` is not a power of two.
pub fn bit_reverse_table(n: usize) -> Vec<usize> {
    let bits = log2_exact(n);
    if bits == 0 {
        return vec![0];
    }
    (0..n)
        .map(|i| i.reverse_bits() >> (usize::BITS - bits))
        .collect()
}

/// Check that `n` is a usable transform size.
pub fn validate_size(n: usize) -> Result<(), FhtError> {
    if !n.is_power_of_two() {
        return Err(FhtError::NotPowerOfTwo { size: n });
    }
    if n < MIN_TRANSFORM_SIZE {
        return Err(FhtError::TooSmall {
            size: n,
            min: MIN_TRANSFORM_SIZE,
        });
    }
    Ok(())
}

/// Immutable tables for transforms of one size.
#[derive(Debug, Clone)]
pub struct FhtPlan<F: FhtFloat> {
    size: usize,
    log2: u32,
    cos: Vec<F>,
    sin: Vec<F>,
    bitrev: Vec<usize>,
}

impl<F: FhtFloat> FhtPlan<F> {
    /// Build the tables for `size`, which must be a power of two >= 4.
    pub fn new(size: usize) -> Result<Self, FhtError> {
        validate_size(size)?;
        let (cos, sin) = trig_tables(size);
        Ok(Self {
            size,
            log2: log2_exact(size),
            cos,
            sin,
            bitrev: bit_reverse_table(size),
        })
    }

    /// Transform length N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// log2(N).
    pub fn log2(&self) -> u32 {
        self.log2
    }

    /// Cosine table, length N/4.
    pub fn cos(&self) -> &[F] {
        &self.cos
    }

    /// Sine table, length N/4.
    pub fn sin(&self) -> &[F] {
        &self.sin
    }

    /// Bit-reversal permutation, length N.
    pub fn bitrev(&self) -> &[usize] {
        &self.bitrev
    }
}

/// Caller-owned cache of plans keyed by transform size.
pub struct FhtPlanner<F: FhtFloat> {
    plans: FxHashMap<usize, Arc<FhtPlan<F>>>,
}

impl<F: FhtFloat> Default for FhtPlanner<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FhtFloat> FhtPlanner<F> {
    /// Empty planner.
    pub fn new() -> Self {
        Self {
            plans: FxHashMap::default(),
        }
    }

    /// Plan for `size`, built on first use and shared afterwards.
    pub fn plan(&mut self, size: usize) -> Result<Arc<FhtPlan<F>>, FhtError> {
        if let Some(plan) = self.plans.get(&size) {
            return Ok(Arc::clone(plan));
        }
        let plan = Arc::new(FhtPlan::new(size)?);
        tracing::debug!(size, "built hartley plan");
        self.plans.insert(size, Arc::clone(&plan));
        Ok(plan)
    }

    /// Number of cached plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// True when nothing has been planned yet.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

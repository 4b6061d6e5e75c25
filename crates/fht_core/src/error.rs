//! Error types for the Hartley engine and its pipelines.

use thiserror::Error;

use crate::progress::Phase;

/// Errors reported by transform, padding, filtering and pipeline calls.
///
/// Every operation validates its inputs before touching any buffer, so an
/// `Err` always means the caller's data is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FhtError {
    /// Transform size is not a power of two.
    #[error("transform size {size} is not a power of two")]
    NotPowerOfTwo {
        /// Offending size.
        size: usize,
    },

    /// Transform size is below the radix-4 minimum.
    #[error("transform size {size} is below the minimum of {min}")]
    TooSmall {
        /// Offending size.
        size: usize,
        /// Smallest supported size.
        min: usize,
    },

    /// A square buffer was required.
    #[error("expected a square buffer, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Region of interest with a zero dimension.
    #[error("region of interest must be non-empty, got {width}x{height}")]
    EmptyRegion {
        /// ROI width.
        width: usize,
        /// ROI height.
        height: usize,
    },

    /// The padded canvas could not be allocated.
    #[error("cannot allocate a {side}x{side} transform canvas")]
    Allocation {
        /// Requested canvas side.
        side: usize,
    },

    /// Two buffers that must agree in shape do not.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected (rows, cols).
        expected: (usize, usize),
        /// Actual (rows, cols).
        actual: (usize, usize),
    },

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller asked to stop between phases.
    #[error("cancelled after {phase}")]
    Cancelled {
        /// Last phase that completed.
        phase: Phase,
    },
}

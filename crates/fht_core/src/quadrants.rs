//! Quadrant swapping between DC-corner and DC-centred layouts.

use ndarray::ArrayViewMut2;

use crate::error::FhtError;

/// Swap the four quadrants of a square, even-sided buffer in place.
///
/// Top-left trades places with bottom-right and top-right with bottom-left,
/// which moves `[0, 0]` to `[n/2, n/2]` and back. Applying it twice is the
/// identity. Works for any element type, so the same routine serves
/// coefficient buffers, filter masks and 8-bit display images.
pub fn swap_quadrants<T: Copy>(mut buffer: ArrayViewMut2<T>) -> Result<(), FhtError> {
    let (rows, cols) = buffer.dim();
    if rows != cols {
        return Err(FhtError::NotSquare { rows, cols });
    }
    if rows % 2 != 0 {
        return Err(FhtError::InvalidConfig(format!(
            "quadrant swap needs an even side, got {}",
            rows
        )));
    }
    let half = rows / 2;
    for r in 0..half {
        for c in 0..half {
            buffer.swap([r, c], [r + half, c + half]);
            buffer.swap([r, c + half], [r + half, c]);
        }
    }
    Ok(())
}

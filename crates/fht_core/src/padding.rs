//! Mirrored tile padding into a power-of-two transform canvas.
//!
//! The region of interest is placed near the centre of a P x P canvas with
//! P the smallest power of two >= 1.5 x its largest side. The rest of the
//! canvas is filled with copies of the region, flipped so that every tile
//! edge repeats its neighbour's edge pixels. The 1.5 margin keeps the
//! periodic continuation of the transform away from the visible region.

use ndarray::{s, Array2, ArrayView2};

use crate::error::FhtError;
use crate::float_trait::FhtFloat;
use crate::tables::MIN_TRANSFORM_SIZE;

/// Largest canvas side accepted by default (f32 canvas of 4 GiB).
const DEFAULT_MAX_CANVAS_SIDE: usize = 1 << 15;
const MAX_CANVAS_SIDE_ENV: &str = "FHT_MAX_CANVAS_SIDE";

/// Placement of the original region inside the padded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Column of the region's left edge.
    pub x: usize,
    /// Row of the region's top edge.
    pub y: usize,
    /// Region width.
    pub width: usize,
    /// Region height.
    pub height: usize,
    /// Side of the square canvas.
    pub size: usize,
}

impl Placement {
    /// Centred placement of a `width` x `height` region; sizes the canvas.
    pub fn for_region(width: usize, height: usize) -> Result<Self, FhtError> {
        let size = padded_size(width, height)?;
        Ok(Self {
            x: (size - width + 1) / 2,
            y: (size - height + 1) / 2,
            width,
            height,
            size,
        })
    }
}

fn resolve_max_canvas_side() -> usize {
    std::env::var(MAX_CANVAS_SIDE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&v| v >= MIN_TRANSFORM_SIZE)
        .unwrap_or(DEFAULT_MAX_CANVAS_SIDE)
}

/// Smallest power of two P >= 1.5 * max(width, height), never below 4.
pub fn padded_size(width: usize, height: usize) -> Result<usize, FhtError> {
    if width == 0 || height == 0 {
        return Err(FhtError::EmptyRegion { width, height });
    }
    let max_side = resolve_max_canvas_side();
    let largest = width.max(height);
    // P >= 1.5 * largest  <=>  P >= ceil(3 * largest / 2)
    let min_side = largest
        .checked_mul(3)
        .ok_or(FhtError::Allocation { side: usize::MAX })?
        .div_ceil(2);
    let mut size = MIN_TRANSFORM_SIZE;
    while size < min_side {
        size = size
            .checked_mul(2)
            .ok_or(FhtError::Allocation { side: usize::MAX })?;
        if size > max_side {
            return Err(FhtError::Allocation { side: size });
        }
    }
    Ok(size)
}

/// Source index for canvas coordinate `pos` along one axis.
#[inline]
fn mirrored_index(pos: usize, origin: usize, len: usize) -> usize {
    let offset = pos as isize - origin as isize;
    let tile = offset.div_euclid(len as isize);
    let local = offset.rem_euclid(len as isize) as usize;
    if tile % 2 == 0 {
        local
    } else {
        len - 1 - local
    }
}

/// Embed `roi` into a mirrored, tiled P x P canvas.
///
/// Returns the canvas and the placement needed to crop the result back.
/// Fails with [`FhtError::Allocation`] when the canvas is larger than the
/// configured maximum or cannot be reserved; `roi` is only read.
pub fn tile_mirrored<F: FhtFloat>(roi: ArrayView2<F>) -> Result<(Array2<F>, Placement), FhtError> {
    let (height, width) = roi.dim();
    let placement = Placement::for_region(width, height)?;
    let size = placement.size;
    let len = size
        .checked_mul(size)
        .ok_or(FhtError::Allocation { side: size })?;

    let mut data: Vec<F> = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| FhtError::Allocation { side: size })?;

    let cols: Vec<usize> = (0..size)
        .map(|px| mirrored_index(px, placement.x, width))
        .collect();
    for py in 0..size {
        let src_row = roi.row(mirrored_index(py, placement.y, height));
        data.extend(cols.iter().map(|&c| src_row[c]));
    }

    let canvas = Array2::from_shape_vec((size, size), data)
        .map_err(|_| FhtError::Allocation { side: size })?;

    tracing::debug!(
        width,
        height,
        size,
        x = placement.x,
        y = placement.y,
        "padded region into mirrored canvas"
    );
    Ok((canvas, placement))
}

/// Cut the placed region back out of a canvas.
pub fn crop<F: FhtFloat>(canvas: ArrayView2<F>, placement: &Placement) -> Result<Array2<F>, FhtError> {
    let expected = (placement.size, placement.size);
    if canvas.dim() != expected {
        return Err(FhtError::DimensionMismatch {
            expected,
            actual: canvas.dim(),
        });
    }
    let Placement {
        x,
        y,
        width,
        height,
        ..
    } = *placement;
    Ok(canvas.slice(s![y..y + height, x..x + width]).to_owned())
}

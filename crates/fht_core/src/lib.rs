//! FHT Core Library
//!
//! Pure Rust 2D Fast Hartley Transform engine and frequency-domain band-pass
//! filter. Images are mirror-padded to a power-of-two canvas, transformed
//! with a radix-4/radix-2 Hartley butterfly network, filtered and cropped
//! back. The Hartley transform is real-to-real, so every stage works on a
//! single float buffer.

pub mod bandpass;
pub mod contrast;
pub mod error;
pub mod float_trait;
pub mod orchestration;
pub mod padding;
pub mod progress;
pub mod quadrants;
pub mod spectrum;
pub mod stack;
pub mod tables;
pub mod transforms;

// Re-export commonly used types at the crate root
pub use bandpass::{
    apply_custom_mask, apply_mask, bandpass_mask, filter_large_small, BandpassConfig,
    BandpassParams, StripeAxis,
};
pub use contrast::{stretch_bounds, DisplayRange};
pub use error::FhtError;
pub use float_trait::FhtFloat;
pub use orchestration::{
    custom_filter_image, fd_math, filter_image, forward_spectrum, inverse_spectrum, FdOperation,
    FilteredImage, Spectrum,
};
pub use padding::{crop, padded_size, tile_mirrored, Placement};
pub use progress::{NoProgress, Phase, ProgressHandle, ProgressSink, ProgressUpdate};
pub use quadrants::swap_quadrants;
pub use spectrum::{amplitude, power_spectrum, power_spectrum_image};
pub use stack::{filter_stack, FilteredStack};
pub use tables::{FhtPlan, FhtPlanner};
pub use transforms::{
    complex_spectrum, conjugate_multiply, divide, fht2d, fht_1d, forward_square, inverse_square,
    multiply,
};

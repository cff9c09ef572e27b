//! Pixel interpolation methods for image transformations.
//!
//! This module provides the interpolation kernels used when resampling
//! images during geometric transformations like resizing, warping, or remapping.
//!
//! # Interpolation Modes
//!
//! - **Nearest**: Fastest, uses nearest pixel value (no interpolation)
//! - **Bilinear**: Smooth linear interpolation between adjacent pixels

mod bilinear;

/// Grid generation and coordinate mapping utilities.
///
/// Functions for generating the coordinate maps consumed by [`remap`].
pub mod grid;

pub(crate) mod interpolate;
mod nearest;
mod remap;

pub use interpolate::{interpolate_pixel, InterpolationMode};
pub use remap::remap;

#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
/// lens distortion correction maps.
pub mod calibration;

/// image basic operations module.
pub mod core;

/// image cropping module.
pub mod crop;

/// utilities to draw on images.
pub mod draw;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;

/// utility functions for resizing images.
pub mod resize;

/// image rotations by multiples of 90 degrees.
pub mod rotate;

/// image geometric transformations module.
pub mod warp;

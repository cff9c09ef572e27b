#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// camera identifiers and per camera tables.
pub mod camera;

/// per camera intrinsics and extrinsics.
pub mod calibration;

/// seam masks, weighted blending and layouts.
pub mod compositor;

/// runtime configuration of the pipeline.
pub mod config;

/// camera specific cropping.
pub mod crop;

/// error types for the surround view pipeline.
pub mod error;

/// frame type and pixel format conversions.
pub mod frame;

/// synthetic test patterns.
pub mod pattern;

/// concurrent orchestration of the four camera pipelines.
pub mod pipeline;

/// geometric projections of single camera frames.
pub mod projection;

/// lens distortion removal.
pub mod undistort;

pub use crate::camera::{CameraId, PerCamera};
pub use crate::calibration::{CalibrationStore, Extrinsics, Intrinsics};
pub use crate::config::SurroundConfig;
pub use crate::error::SurroundError;
pub use crate::frame::{Frame, WeightMask};
pub use crate::pipeline::{
    CameraStatus, CompositionMode, CompositionResult, SurroundView, SurroundViewBuilder,
};

//! Geometric image transformations.
//!
//! This module provides functions for remapping images into other coordinate
//! systems:
//!
//! - Perspective transformations (homographies) and their estimation from
//!   four point correspondences
//! - Cylindrical and spherical dewarping
//!
//! # Examples
//!
//! Estimating a homography from four correspondences:
//!
//! ```
//! use surround_imgproc::warp::get_perspective_transform;
//!
//! let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
//! let dst = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
//! let m = get_perspective_transform(&src, &dst).unwrap();
//! assert!((m[0] - 2.0).abs() < 1e-5);
//! ```

mod cylindrical;
mod perspective;

pub use cylindrical::{warp_cylindrical, warp_spherical};
pub use perspective::{get_perspective_transform, transform_point, warp_perspective};

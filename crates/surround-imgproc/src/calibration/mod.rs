/// polynomial (radial-tangential) distortion model.
pub mod distortion;

/// Kannala-Brandt equidistant fisheye model.
pub mod fisheye;

/// Represents the instrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsic {
    /// Build the intrinsics from a row-major 3x3 camera matrix.
    ///
    /// Only the focal lengths and the principal point are read, skew is
    /// ignored.
    pub fn from_matrix(k: &[[f64; 3]; 3]) -> Self {
        Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        }
    }

    /// Return a copy with both focal lengths multiplied by `scale`.
    ///
    /// The principal point is kept. A scale below one widens the field of
    /// view of a rectified image.
    pub fn scaled_focal(&self, scale: f64) -> Self {
        Self {
            fx: self.fx * scale,
            fy: self.fy * scale,
            ..*self
        }
    }

    /// Normalize a pixel coordinate with this camera matrix.
    #[inline]
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.cx) / self.fx, (y - self.cy) / self.fy)
    }

    /// Project a normalized coordinate back to pixels.
    #[inline]
    pub fn denormalize(&self, x: f64, y: f64) -> (f64, f64) {
        (self.fx * x + self.cx, self.fy * y + self.cy)
    }
}

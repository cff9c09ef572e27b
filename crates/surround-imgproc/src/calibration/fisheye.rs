use super::CameraIntrinsic;
use crate::interpolation::grid::meshgrid_from_fn;
use surround_image::{Image, ImageError, ImageSize};

/// Distortion coefficients of the Kannala-Brandt (equidistant) fisheye model.
///
/// A ray at angle `theta` from the optical axis lands at a normalized radius
/// `theta_d = theta (1 + k1 theta² + k2 theta⁴ + k3 theta⁶ + k4 theta⁸)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KannalaBrandtDistortion {
    /// first coefficient
    pub k1: f64,
    /// second coefficient
    pub k2: f64,
    /// third coefficient
    pub k3: f64,
    /// fourth coefficient
    pub k4: f64,
}

impl From<[f64; 4]> for KannalaBrandtDistortion {
    fn from(d: [f64; 4]) -> Self {
        Self {
            k1: d[0],
            k2: d[1],
            k3: d[2],
            k4: d[3],
        }
    }
}

/// Distort a normalized undistorted point with the fisheye model.
///
/// # Arguments
///
/// * `x` - The x coordinate on the normalized image plane.
/// * `y` - The y coordinate on the normalized image plane.
/// * `distortion` - The fisheye coefficients.
///
/// # Returns
///
/// The distorted normalized coordinates.
pub fn distort_normalized_fisheye(
    x: f64,
    y: f64,
    distortion: &KannalaBrandtDistortion,
) -> (f64, f64) {
    let r = (x * x + y * y).sqrt();
    if r < 1e-12 {
        return (x, y);
    }

    let theta = r.atan();
    let theta2 = theta * theta;
    let theta4 = theta2 * theta2;
    let theta6 = theta4 * theta2;
    let theta8 = theta4 * theta4;

    let theta_d = theta
        * (1.0
            + distortion.k1 * theta2
            + distortion.k2 * theta4
            + distortion.k3 * theta6
            + distortion.k4 * theta8);

    let scale = theta_d / r;
    (x * scale, y * scale)
}

/// Generate the undistortion map for the fisheye model.
///
/// Every pixel of the output is normalized with `new_intrinsic`, distorted,
/// and projected with `intrinsic`.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the fisheye camera.
/// * `new_intrinsic` - The intrinsic parameters of the rectified output.
/// * `distortion` - The fisheye coefficients.
/// * `size` - The size of the output image.
pub fn generate_correction_map_fisheye(
    intrinsic: &CameraIntrinsic,
    new_intrinsic: &CameraIntrinsic,
    distortion: &KannalaBrandtDistortion,
    size: &ImageSize,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    meshgrid_from_fn(size.width, size.height, |x, y| {
        let (xn, yn) = new_intrinsic.normalize(x as f64, y as f64);
        let (xd, yd) = distort_normalized_fisheye(xn, yn, distortion);
        let (xdst, ydst) = intrinsic.denormalize(xd, yd);
        Ok((xdst as f32, ydst as f32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centre_is_fixed() {
        let d = KannalaBrandtDistortion::from([0.1, -0.05, 0.01, 0.0]);
        assert_eq!(distort_normalized_fisheye(0.0, 0.0, &d), (0.0, 0.0));
    }

    #[test]
    fn test_zero_coefficients_is_equidistant() {
        let d = KannalaBrandtDistortion::default();
        let (x, y) = distort_normalized_fisheye(1.0, 0.0, &d);
        // atan(1) with no polynomial terms
        assert_relative_eq!(x, std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn test_polynomial_terms() {
        let d = KannalaBrandtDistortion::from([0.5, 0.0, 0.0, 0.0]);
        let (x, y) = distort_normalized_fisheye(0.0, 1.0, &d);
        let theta = std::f64::consts::FRAC_PI_4;
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, theta * (1.0 + 0.5 * theta * theta), epsilon = 1e-12);
    }

    #[test]
    fn test_fisheye_map_shrinks_towards_centre() -> Result<(), ImageError> {
        let k = CameraIntrinsic {
            fx: 10.0,
            fy: 10.0,
            cx: 10.0,
            cy: 10.0,
        };
        let size = ImageSize {
            width: 21,
            height: 21,
        };
        let (map_x, map_y) =
            generate_correction_map_fisheye(&k, &k, &KannalaBrandtDistortion::default(), &size)?;

        let centre = 10 * 21 + 10;
        assert_relative_eq!(map_x.as_slice()[centre], 10.0);
        assert_relative_eq!(map_y.as_slice()[centre], 10.0);

        // x = 20 is one unit from the centre, lands at atan(1) units
        let edge = 10 * 21 + 20;
        let expected = 10.0 + 10.0 * std::f64::consts::FRAC_PI_4;
        assert_relative_eq!(map_x.as_slice()[edge], expected as f32, epsilon = 1e-4);
        Ok(())
    }
}

use super::CameraIntrinsic;
use crate::interpolation::grid::meshgrid_from_fn;
use surround_image::{Image, ImageError, ImageSize};

/// Represents the polynomial distortion parameters of a camera
///
/// The radial part is the rational model `(1 + k1 r² + k2 r⁴ + k3 r⁶) /
/// (1 + k4 r² + k5 r⁴ + k6 r⁶)`, the tangential part uses `p1` and `p2`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

impl PolynomialDistortion {
    /// Build the model from a four element coefficient vector laid out as
    /// `[k1, k2, p1, p2]`.
    pub fn from_opencv_coefficients(d: &[f64; 4]) -> Self {
        Self {
            k1: d[0],
            k2: d[1],
            p1: d[2],
            p2: d[3],
            ..Default::default()
        }
    }
}

/// Distort a normalized point using polynomial distortion
pub fn distort_normalized_polynomial(
    x: f64,
    y: f64,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let PolynomialDistortion {
        k1,
        k2,
        k3,
        k4,
        k5,
        k6,
        p1,
        p2,
    } = *distortion;

    // calculate the radial distance
    let r2 = x * x + y * y;

    // radial distortion
    let kr = (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2)
        / (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2);

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    (xd, yd)
}

/// Distort a point using polynomial distortion
///
/// # Arguments
///
/// * `x` - The x coordinate of the point
/// * `y` - The y coordinate of the point
/// * `intrinsic` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// * `x` - The x coordinate of the distorted point
/// * `y` - The y coordinate of the distorted point
pub fn distort_point_polynomial(
    x: f64,
    y: f64,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (x, y) = intrinsic.normalize(x, y);
    let (xd, yd) = distort_normalized_polynomial(x, y, distortion);
    intrinsic.denormalize(xd, yd)
}

/// Generate the undistortion map for a polynomial distortion model
///
/// Every pixel of the output is normalized with `new_intrinsic`, distorted,
/// and projected with `intrinsic`, which gives its position in the
/// distorted input image.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the distorted camera
/// * `new_intrinsic` - The intrinsic parameters of the rectified output
/// * `distortion` - The distortion parameters of the camera
/// * `size` - The size of the output image
///
/// # Returns
///
/// * `map_x` - The x map for undistorting the image
/// * `map_y` - The y map for undistorting the image
pub fn generate_correction_map_polynomial(
    intrinsic: &CameraIntrinsic,
    new_intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
    size: &ImageSize,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    meshgrid_from_fn(size.width, size.height, |x, y| {
        let (xn, yn) = new_intrinsic.normalize(x as f64, y as f64);
        let (xd, yd) = distort_normalized_polynomial(xn, yn, distortion);
        let (xdst, ydst) = intrinsic.denormalize(xd, yd);
        Ok((xdst as f32, ydst as f32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn intrinsic() -> CameraIntrinsic {
        CameraIntrinsic {
            fx: 577.48583984375,
            fy: 652.8748779296875,
            cx: 577.48583984375,
            cy: 386.1428833007813,
        }
    }

    fn distortion() -> PolynomialDistortion {
        PolynomialDistortion {
            k1: 1.7547749280929563,
            k2: 0.0097926277667284,
            k3: -0.027250492945313457,
            k4: 2.1092164516448975,
            k5: 0.462927520275116,
            k6: -0.08215277642011642,
            p1: -0.00005457743463921361,
            p2: 0.00003006766564794816,
        }
    }

    #[test]
    fn test_distort_point_polynomial() {
        let (x, y) = distort_point_polynomial(100.0, 20.0, &intrinsic(), &distortion());
        assert_ne!(x, 194.24656721843076);
        assert_relative_eq!(y, 98.83006704526377, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_distortion_is_identity() {
        let d = PolynomialDistortion::default();
        let (x, y) = distort_point_polynomial(123.0, 45.0, &intrinsic(), &d);
        assert_relative_eq!(x, 123.0, epsilon = 1e-9);
        assert_relative_eq!(y, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_opencv_coefficients() {
        let d = PolynomialDistortion::from_opencv_coefficients(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!((d.k1, d.k2, d.p1, d.p2), (0.1, 0.2, 0.3, 0.4));
        assert_eq!((d.k3, d.k4, d.k5, d.k6), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_correction_map_polynomial() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let (map_x, map_y) =
            generate_correction_map_polynomial(&intrinsic(), &intrinsic(), &distortion(), &size)?;

        assert_eq!(map_x.size(), size);
        assert_eq!(map_y.size(), size);

        let (x, y) = distort_point_polynomial(3.0, 2.0, &intrinsic(), &distortion());
        let idx = 2 * 8 + 3;
        assert_relative_eq!(map_x.as_slice()[idx], x as f32, epsilon = 1e-3);
        assert_relative_eq!(map_y.as_slice()[idx], y as f32, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn test_correction_map_scaled_focal() -> Result<(), ImageError> {
        let k = CameraIntrinsic {
            fx: 100.0,
            fy: 100.0,
            cx: 50.0,
            cy: 50.0,
        };
        let new_k = k.scaled_focal(0.5);
        let size = ImageSize {
            width: 101,
            height: 101,
        };
        let (map_x, map_y) = generate_correction_map_polynomial(
            &k,
            &new_k,
            &PolynomialDistortion::default(),
            &size,
        )?;

        // the principal point is fixed, other pixels move away from it
        let centre = 50 * 101 + 50;
        assert_relative_eq!(map_x.as_slice()[centre], 50.0);
        assert_relative_eq!(map_y.as_slice()[centre], 50.0);
        assert_relative_eq!(map_x.as_slice()[50 * 101 + 60], 70.0, epsilon = 1e-4);
        Ok(())
    }
}

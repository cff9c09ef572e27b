use crate::{
    interpolation::{grid::meshgrid_from_fn, interpolate_pixel, InterpolationMode},
    parallel,
};

use surround_image::{Image, ImageDtype, ImageError};

#[rustfmt::skip]
fn determinant3x3(m: &[f32; 9]) -> f32 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f32; 9]) -> [f32; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

fn inverse_perspective_matrix(m: &[f32; 9]) -> Result<[f32; 9], ImageError> {
    let det = determinant3x3(m);

    if det == 0.0 {
        return Err(ImageError::CannotComputeDeterminant);
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (inv, a) in inv_m.iter_mut().zip(adj.iter()) {
        *inv = a * inv_det;
    }

    Ok(inv_m)
}

/// Apply a 3x3 perspective matrix to a point.
///
/// # Arguments
///
/// * `x` - The x coordinate of the point.
/// * `y` - The y coordinate of the point.
/// * `m` - The row-major 3x3 perspective matrix.
pub fn transform_point(x: f32, y: f32, m: &[f32; 9]) -> (f32, f32) {
    let w = m[6] * x + m[7] * y + m[8];
    let xw = (m[0] * x + m[1] * y + m[2]) / w;
    let yw = (m[3] * x + m[4] * y + m[5]) / w;
    (xw, yw)
}

/// Compute the perspective transform that maps four source points onto four
/// destination points.
///
/// The 8 unknowns of the homography (with `m[8] = 1`) are found by solving
/// the linear system built from the correspondences with Gaussian
/// elimination and partial pivoting.
///
/// # Arguments
///
/// * `src` - Four points `[x, y]` in the source image.
/// * `dst` - The four corresponding points in the destination image.
///
/// # Returns
///
/// The row-major 3x3 matrix mapping `src -> dst`.
///
/// # Errors
///
/// If three of the points are collinear the system is singular and an error
/// is returned.
pub fn get_perspective_transform(
    src: &[[f32; 2]; 4],
    dst: &[[f32; 2]; 4],
) -> Result<[f32; 9], ImageError> {
    let mut a = [[0.0f64; 9]; 8];

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s[0] as f64, s[1] as f64);
        let (u, v) = (d[0] as f64, d[1] as f64);
        a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
        a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
    }

    // forward elimination
    for col in 0..8 {
        let pivot = (col..8)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 {
            return Err(ImageError::SingularSystem);
        }

        a.swap(col, pivot);

        for row in col + 1..8 {
            let factor = a[row][col] / a[col][col];
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    // back substitution
    let mut h = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut acc = a[row][8];
        for k in row + 1..8 {
            acc -= a[row][k] * h[k];
        }
        h[row] = acc / a[row][row];
    }

    Ok([
        h[0] as f32,
        h[1] as f32,
        h[2] as f32,
        h[3] as f32,
        h[4] as f32,
        h[5] as f32,
        h[6] as f32,
        h[7] as f32,
        1.0,
    ])
}

/// Applies a perspective transformation to an image.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 3x3 perspective transformation matrix src -> dst.
/// * `interpolation` - The interpolation mode to use.
///
/// Destination pixels that map outside the source keep their value.
///
/// # Example
///
/// ```
/// use surround_image::{Image, ImageSize};
/// use surround_imgproc::interpolation::InterpolationMode;
/// use surround_imgproc::warp::warp_perspective;
///
/// let src = Image::<f32, 1>::new(
///   ImageSize {
///     width: 4,
///     height: 5,
///   },
///   vec![0.0f32; 4 * 5]
/// ).unwrap();
///
/// let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
///
/// let mut dst = Image::<f32, 1>::from_size_val(
///   ImageSize {
///     width: 2,
///     height: 3,
///   },
///   0.0
/// ).unwrap();
///
/// warp_perspective(&src, &mut dst, &m, InterpolationMode::Bilinear).unwrap();
///
/// assert_eq!(dst.size().width, 2);
/// assert_eq!(dst.size().height, 3);
/// ```
pub fn warp_perspective<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &[f32; 9],
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    // inverse perspective matrix
    let inv_m = inverse_perspective_matrix(m)?;

    // create meshgrid to find corresponding positions in dst from src
    let (dst_rows, dst_cols) = (dst.rows(), dst.cols());
    let (map_x, map_y) = meshgrid_from_fn(dst_cols, dst_rows, |x, y| {
        Ok(transform_point(x as f32, y as f32, &inv_m))
    })?;

    let (src_cols, src_rows) = (src.cols() as f32, src.rows() as f32);

    parallel::par_iter_rows_resample(dst, &map_x, &map_y, |x, y, dst_pixel| {
        if x >= 0.0f32 && x < src_cols && y >= 0.0f32 && y < src_rows {
            let values = interpolate_pixel(src, x, y, interpolation);
            for (pixel, value) in dst_pixel.iter_mut().zip(values) {
                *pixel = T::from_f32(value);
            }
        }
    });

    Ok(())
}

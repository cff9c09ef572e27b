use rayon::prelude::*;
use surround_image::{Image, ImageError, ImageSize};

/// Create a pair of coordinate maps of shape (rows, cols) from a function.
///
/// # Arguments
///
/// * `cols` - The number of columns indicating the width of the grid
/// * `rows` - The number of rows indicating the height of the grid
/// * `f` - Function receiving the destination `(x, y)` and returning the
///   sampling coordinates `(u, v)` in the source image.
///
/// # Returns
///
/// A tuple with the `map_x` and `map_y` single channel images.
///
/// # Example
///
/// ```
/// use surround_imgproc::interpolation::grid::meshgrid_from_fn;
///
/// let (map_x, map_y) = meshgrid_from_fn(3, 2, |x, y| Ok((x as f32, y as f32))).unwrap();
///
/// assert_eq!(map_x.as_slice(), &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0]);
/// assert_eq!(map_y.as_slice(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
/// ```
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> Result<(f32, f32), ImageError> + Send + Sync,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    let size = ImageSize {
        width: cols,
        height: rows,
    };

    let mut map_x = Image::<f32, 1>::from_size_val(size, 0.0)?;
    let mut map_y = Image::<f32, 1>::from_size_val(size, 0.0)?;

    if size.is_empty() {
        return Ok((map_x, map_y));
    }

    map_x
        .as_slice_mut()
        .par_chunks_exact_mut(cols)
        .zip(map_y.as_slice_mut().par_chunks_exact_mut(cols))
        .enumerate()
        .try_for_each(|(y, (row_x, row_y))| {
            for (x, (u, v)) in row_x.iter_mut().zip(row_y.iter_mut()).enumerate() {
                (*u, *v) = f(x, y)?;
            }
            Ok::<(), ImageError>(())
        })?;

    Ok((map_x, map_y))
}

use crate::parallel::par_iter_rows_indexed;
use surround_image::{Image, ImageError, ImageSize};

fn transposed_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: size.height,
        height: size.width,
    }
}

fn rotate_with<T, const C: usize>(
    src: &Image<T, C>,
    dst_size: ImageSize,
    src_coord: impl Fn(usize, usize) -> (usize, usize) + Send + Sync,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let mut dst = Image::from_size_val(dst_size, T::default())?;
    let (src_cols, src_data) = (src.cols(), src.as_slice());

    par_iter_rows_indexed(&mut dst, |x, y, dst_pixel| {
        let (sx, sy) = src_coord(x, y);
        let offset = (sy * src_cols + sx) * C;
        dst_pixel.copy_from_slice(&src_data[offset..offset + C]);
    });

    Ok(dst)
}

/// Rotate an image by 90 degrees clockwise.
///
/// The width and height of the output are swapped with respect to the input.
///
/// # Example
///
/// ```
/// use surround_image::Image;
/// use surround_imgproc::rotate::rotate_90_clockwise;
///
/// let image = Image::<u8, 1>::new([3, 2].into(), vec![0, 1, 2, 3, 4, 5]).unwrap();
/// let rotated = rotate_90_clockwise(&image).unwrap();
///
/// assert_eq!(rotated.size(), [2, 3].into());
/// assert_eq!(rotated.as_slice(), &[3, 0, 4, 1, 5, 2]);
/// ```
pub fn rotate_90_clockwise<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let rows = src.rows();
    rotate_with(src, transposed_size(src.size()), |x, y| (y, rows - 1 - x))
}

/// Rotate an image by 90 degrees counterclockwise.
///
/// The width and height of the output are swapped with respect to the input.
pub fn rotate_90_counterclockwise<T, const C: usize>(
    src: &Image<T, C>,
) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let cols = src.cols();
    rotate_with(src, transposed_size(src.size()), |x, y| (cols - 1 - y, x))
}

/// Rotate an image by 180 degrees.
pub fn rotate_180<T, const C: usize>(src: &Image<T, C>) -> Result<Image<T, C>, ImageError>
where
    T: Copy + Default + Send + Sync,
{
    let (cols, rows) = (src.cols(), src.rows());
    rotate_with(src, src.size(), |x, y| (cols - 1 - x, rows - 1 - y))
}
